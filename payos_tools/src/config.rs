use std::time::Duration;

use bks_common::{
    helpers::{env_number, env_string_or},
    Secret,
};
use log::*;

pub const DEFAULT_PAYOS_API_URL: &str = "https://api-merchant.payos.vn";
pub const DEFAULT_RETURN_URL: &str = "http://localhost:3333/payment-result";
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:8989/api/payments/payos/webhook";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct PayosConfig {
    pub client_id: String,
    pub api_key: Secret<String>,
    pub checksum_key: Secret<String>,
    /// Base URL of the merchant API, without a trailing slash
    pub api_url: String,
    /// Where the gateway sends the buyer after payment. Also used as the cancel URL.
    pub return_url: String,
    /// The callback registered with the gateway for status notifications
    pub webhook_url: String,
    pub timeout: Duration,
}

impl Default for PayosConfig {
    fn default() -> Self {
        Self {
            client_id: String::default(),
            api_key: Secret::default(),
            checksum_key: Secret::default(),
            api_url: DEFAULT_PAYOS_API_URL.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl PayosConfig {
    pub fn new_from_env_or_default() -> Self {
        let client_id = std::env::var("PAYOS_CLIENT_ID").unwrap_or_else(|_| {
            warn!("🪛️ PAYOS_CLIENT_ID not set. Gateway calls will be rejected until it is configured.");
            String::default()
        });
        let api_key = Secret::new(std::env::var("PAYOS_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ PAYOS_API_KEY not set. Gateway calls will be rejected until it is configured.");
            String::default()
        }));
        let checksum_key = Secret::new(std::env::var("PAYOS_CHECKSUM_KEY").unwrap_or_else(|_| {
            warn!("🪛️ PAYOS_CHECKSUM_KEY not set. Signatures will not match the gateway's.");
            String::default()
        }));
        let api_url = env_string_or("PAYOS_API_URL", DEFAULT_PAYOS_API_URL).trim_end_matches('/').to_string();
        let return_url = env_string_or("PAYOS_RETURN_URL", DEFAULT_RETURN_URL);
        let webhook_url = env_string_or("PAYOS_WEBHOOK_URL", DEFAULT_WEBHOOK_URL);
        let timeout = Duration::from_millis(env_number("PAYOS_TIMEOUT_MS", DEFAULT_TIMEOUT_MS));
        Self { client_id, api_key, checksum_key, api_url, return_url, webhook_url, timeout }
    }

    pub fn with_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_credentials(mut self, client_id: &str, api_key: &str, checksum_key: &str) -> Self {
        self.client_id = client_id.to_string();
        self.api_key = Secret::new(api_key.to_string());
        self.checksum_key = Secret::new(checksum_key.to_string());
        self
    }
}
