use serde_json::Value;
use thiserror::Error;

use crate::db_types::NotificationTarget;

/// Delivers outbox notifications to the services that need them.
#[allow(async_fn_in_trait)]
pub trait Notifier: Clone {
    /// Sends `payload` to the endpoint behind `target`. Any `Err` is treated as retryable.
    async fn deliver(&self, target: NotificationTarget, payload: &Value) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Could not reach {target}. {reason}")]
    Unreachable { target: NotificationTarget, reason: String },
    #[error("{target} answered with status {status}. {body}")]
    Rejected { target: NotificationTarget, status: u16, body: String },
}
