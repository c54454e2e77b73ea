use std::{fmt::Debug, time::Duration};

use bks_common::helpers::env_number;
use chrono::Utc;
use log::*;

use crate::{
    api::errors::PaymentFlowError,
    db_types::{OrderCode, OutboxMessage},
    traits::{Notifier, OutboxManagement, RetryUpdate},
};

pub const DEFAULT_OUTBOX_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_OUTBOX_MAX_ATTEMPTS: i64 = 10;
pub const DEFAULT_OUTBOX_BATCH_SIZE: i64 = 50;
/// Upper bound on the delay between two delivery attempts of the same message
pub const MAX_BACKOFF_SECS: i64 = 300;
/// Safety valve on the number of fetch rounds a single dispatch may run
const MAX_DISPATCH_ROUNDS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboxConfig {
    /// How often the background worker sweeps the outbox
    pub interval: Duration,
    /// After this many failed attempts a message is marked `Dead`
    pub max_attempts: i64,
    pub batch_size: i64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_OUTBOX_INTERVAL_SECS),
            max_attempts: DEFAULT_OUTBOX_MAX_ATTEMPTS,
            batch_size: DEFAULT_OUTBOX_BATCH_SIZE,
        }
    }
}

impl OutboxConfig {
    pub fn from_env_or_default() -> Self {
        let interval = env_number("BPS_OUTBOX_INTERVAL_SECS", DEFAULT_OUTBOX_INTERVAL_SECS).max(1);
        let max_attempts = env_number("BPS_OUTBOX_MAX_ATTEMPTS", DEFAULT_OUTBOX_MAX_ATTEMPTS).max(1);
        let batch_size = env_number("BPS_OUTBOX_BATCH_SIZE", DEFAULT_OUTBOX_BATCH_SIZE).max(1);
        Self { interval: Duration::from_secs(interval), max_attempts, batch_size }
    }
}

/// What a single dispatch run achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    /// Failed and scheduled for another attempt
    pub retried: usize,
    /// Failed for the last time
    pub dead: usize,
    /// Claimed by another dispatcher in the meantime
    pub skipped: usize,
}

impl DispatchSummary {
    pub fn is_empty(&self) -> bool {
        self.delivered + self.retried + self.dead + self.skipped == 0
    }
}

/// The delay before attempt number `attempts + 1`: `2^attempts` seconds, capped at [`MAX_BACKOFF_SECS`].
pub fn backoff(attempts: i64) -> chrono::Duration {
    let exp = attempts.clamp(0, 9) as u32;
    chrono::Duration::seconds(2i64.pow(exp).min(MAX_BACKOFF_SECS))
}

/// `OutboxApi` delivers the notifications that the checkout and reconciliation flows leave in the outbox.
///
/// Delivery is at-least-once. Messages for the same order are delivered in the order they were recorded; a message
/// that keeps failing holds back later messages for that order only.
pub struct OutboxApi<B, N> {
    db: B,
    notifier: N,
    config: OutboxConfig,
}

impl<B, N> Debug for OutboxApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutboxApi ({:?})", self.config)
    }
}

impl<B: Clone, N: Clone> Clone for OutboxApi<B, N> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), notifier: self.notifier.clone(), config: self.config }
    }
}

impl<B, N> OutboxApi<B, N> {
    pub fn new(db: B, notifier: N, config: OutboxConfig) -> Self {
        Self { db, notifier, config }
    }

    pub fn config(&self) -> &OutboxConfig {
        &self.config
    }
}

impl<B, N> OutboxApi<B, N>
where
    B: OutboxManagement,
    N: Notifier,
{
    /// Delivers every message that is currently due.
    pub async fn dispatch_pending(&self) -> Result<DispatchSummary, PaymentFlowError> {
        self.dispatch(None).await
    }

    /// Delivers the due messages of a single order. Called straight after a change so that the common case does not
    /// wait for the next sweep.
    pub async fn dispatch_for(&self, code: &OrderCode) -> Result<DispatchSummary, PaymentFlowError> {
        self.dispatch(Some(code)).await
    }

    /// Returns messages that were claimed by a previous run of the service to the queue.
    pub async fn recover_in_flight(&self) -> Result<u64, PaymentFlowError> {
        let count = self.db.reset_in_flight().await?;
        Ok(count)
    }

    pub async fn messages_for(&self, code: &OrderCode) -> Result<Vec<OutboxMessage>, PaymentFlowError> {
        let messages = self.db.fetch_outbox_for_order(code).await?;
        Ok(messages)
    }

    async fn dispatch(&self, code: Option<&OrderCode>) -> Result<DispatchSummary, PaymentFlowError> {
        let mut summary = DispatchSummary::default();
        // Delivering a message can make the next message for the same order due, hence the rounds
        for _ in 0..MAX_DISPATCH_ROUNDS {
            let batch = self.db.fetch_due_messages(code, Utc::now(), self.config.batch_size).await?;
            if batch.is_empty() {
                break;
            }
            trace!("📮️ {} outbox messages are due", batch.len());
            let delivered_before = summary.delivered;
            for message in batch {
                self.dispatch_message(message, &mut summary).await?;
            }
            if summary.delivered == delivered_before {
                break;
            }
        }
        if !summary.is_empty() {
            debug!("📮️ Outbox dispatch complete: {summary:?}");
        }
        Ok(summary)
    }

    async fn dispatch_message(
        &self,
        message: OutboxMessage,
        summary: &mut DispatchSummary,
    ) -> Result<(), PaymentFlowError> {
        if !self.db.claim_message(message.id).await? {
            trace!("📮️ Message #{} was claimed elsewhere", message.id);
            summary.skipped += 1;
            return Ok(());
        }
        match self.notifier.deliver(message.target, &message.payload).await {
            Ok(()) => {
                self.db.mark_delivered(message.id).await?;
                debug!("📮️ {} notification #{} for {} delivered", message.target, message.id, message.order_code);
                summary.delivered += 1;
            },
            Err(e) => {
                let attempts = message.attempts + 1;
                let dead = attempts >= self.config.max_attempts;
                let next_attempt_at = Utc::now() + backoff(attempts);
                if dead {
                    error!(
                        "📮️ Giving up on {} notification #{} for {} after {attempts} attempts. {e}",
                        message.target, message.id, message.order_code
                    );
                    summary.dead += 1;
                } else {
                    warn!(
                        "📮️ {} notification #{} for {} failed (attempt {attempts}). Retrying at {next_attempt_at}. {e}",
                        message.target, message.id, message.order_code
                    );
                    summary.retried += 1;
                }
                let update = RetryUpdate { attempts, next_attempt_at, last_error: e.to_string(), dead };
                self.db.reschedule_message(message.id, update).await?;
            },
        }
        Ok(())
    }
}
