use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{OrderCode, OutboxMessage};

/// The outcome of a failed delivery attempt, as recorded against an outbox message.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryUpdate {
    pub attempts: i64,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: String,
    /// Give up on the message. It stays in the outbox with `Dead` status.
    pub dead: bool,
}

/// Access to the transactional outbox.
///
/// Messages for the same order code are delivered in insertion order. A message is only *due* once its
/// `next_attempt_at` has passed and no older message for the same order code is still `Pending` or `Processing`.
#[allow(async_fn_in_trait)]
pub trait OutboxManagement: Clone {
    /// Up to `limit` due messages, oldest first. When `order_code` is given only that order's messages are considered.
    async fn fetch_due_messages(
        &self,
        order_code: Option<&OrderCode>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<OutboxMessage>, OutboxError>;

    /// Moves a message from `Pending` to `Processing`. Returns false if another dispatcher got there first.
    async fn claim_message(&self, id: i64) -> Result<bool, OutboxError>;

    async fn mark_delivered(&self, id: i64) -> Result<(), OutboxError>;

    /// Records a failed attempt and returns the message to `Pending` (or `Dead`).
    async fn reschedule_message(&self, id: i64, update: RetryUpdate) -> Result<(), OutboxError>;

    /// Returns every `Processing` message to `Pending`. Called at start-up, since a claim that survived a restart can
    /// never complete. Returns the number of messages reset.
    async fn reset_in_flight(&self) -> Result<u64, OutboxError>;

    /// Every outbox message recorded for the order, in insertion order.
    async fn fetch_outbox_for_order(&self, code: &OrderCode) -> Result<Vec<OutboxMessage>, OutboxError>;
}

#[derive(Debug, Clone, Error)]
pub enum OutboxError {
    #[error("Outbox database error: {0}")]
    DatabaseError(String),
    #[error("Outbox message {0} does not exist")]
    MessageNotFound(i64),
    #[error("Could not (de)serialize an outbox payload. {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for OutboxError {
    fn from(e: sqlx::Error) -> Self {
        OutboxError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for OutboxError {
    fn from(e: serde_json::Error) -> Self {
        OutboxError::SerializationError(e.to_string())
    }
}
