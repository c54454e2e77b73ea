use thiserror::Error;

use crate::{
    db_types::OrderCode,
    traits::{OutboxError, TransactionStoreError},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("A transaction with order code {0} already exists")]
    DuplicateOrderCode(OrderCode),
    #[error("Stored JSON could not be read or written. {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Outbox message {0} does not exist")]
    OutboxMessageNotFound(i64),
}

impl From<SqliteDatabaseError> for TransactionStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DuplicateOrderCode(code) => TransactionStoreError::DuplicateOrderCode(code),
            SqliteDatabaseError::JsonError(e) => TransactionStoreError::SerializationError(e.to_string()),
            e => TransactionStoreError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for OutboxError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::OutboxMessageNotFound(id) => OutboxError::MessageNotFound(id),
            SqliteDatabaseError::JsonError(e) => OutboxError::SerializationError(e.to_string()),
            e => OutboxError::DatabaseError(e.to_string()),
        }
    }
}
