//! Server configuration
//!
//! Everything is read from the environment exactly once, at startup. Missing or invalid values are logged and
//! replaced by their defaults, so the server will always start; check the log if it does not behave as expected.
use bks_common::helpers::{env_flag, env_number};
use checkout_engine::OutboxConfig;
use log::*;
use payos_tools::PayosConfig;

use crate::integrations::downstream::DownstreamConfig;

const DEFAULT_BPS_HOST: &str = "127.0.0.1";
const DEFAULT_BPS_PORT: u16 = 8989;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/payments.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub payos: PayosConfig,
    /// If false, webhooks are accepted without checking their signature. **DANGER**
    pub signature_checks: bool,
    /// Where outbox notifications are delivered
    pub downstream: DownstreamConfig,
    pub outbox: OutboxConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPS_HOST.to_string(),
            port: DEFAULT_BPS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            payos: PayosConfig::default(),
            signature_checks: true,
            downstream: DownstreamConfig::default(),
            outbox: OutboxConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = std::env::var("BPS_HOST").ok().unwrap_or_else(|| DEFAULT_BPS_HOST.into());
        let port = env_number("BPS_PORT", DEFAULT_BPS_PORT);
        let database_url = std::env::var("BPS_DATABASE_URL").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            warn!("🪛️ BPS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let payos = PayosConfig::new_from_env_or_default();
        let signature_checks = env_flag("PAYOS_SIGNATURE_CHECKS", true);
        let downstream = DownstreamConfig::from_env_or_default();
        let outbox = OutboxConfig::from_env_or_default();
        Self { host, port, database_url, payos, signature_checks, downstream, outbox }
    }

    /// Logs a warning for every setting that must not be used in production. Returns `true` if there were any.
    pub fn warn_about_insecure_settings(&self) -> bool {
        if self.signature_checks {
            return false;
        }
        warn!(
            "🪛️ Webhook signature checks are DISABLED. Anyone can mark payments as paid. Do not run this \
             configuration in production."
        );
        true
    }
}
