use thiserror::Error;

use crate::{
    db_types::{NewPaymentTransaction, OrderCode, PaymentEvent, PaymentEventRecord, PaymentTransaction},
    traits::data_objects::{StatusChange, TransactionQueryFilter},
};

/// Durable storage for payment transactions and their history.
///
/// Implementations must guarantee that
/// * order codes are unique,
/// * a transaction, its initial history and its outbox entries are written atomically,
/// * status writes are conditional on the stored version (see [`TransactionStore::apply_status_change`]).
#[allow(async_fn_in_trait)]
pub trait TransactionStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new transaction together with its history records and outbox notifications in a single atomic
    /// transaction. A clash on the order code results in [`TransactionStoreError::DuplicateOrderCode`] and nothing is
    /// written.
    async fn insert_transaction(&self, tx: NewPaymentTransaction) -> Result<PaymentTransaction, TransactionStoreError>;

    async fn fetch_transaction(&self, code: &OrderCode) -> Result<Option<PaymentTransaction>, TransactionStoreError>;

    /// Looks a transaction up by the numeric code the gateway knows it by.
    async fn fetch_transaction_by_gateway_code(
        &self,
        gateway_code: i64,
    ) -> Result<Option<PaymentTransaction>, TransactionStoreError>;

    /// The payment history of a transaction, oldest first.
    async fn fetch_payment_events(&self, code: &OrderCode) -> Result<Vec<PaymentEventRecord>, TransactionStoreError>;

    /// Writes a new status, provided the stored version still equals `change.expected_version`. The history entry and
    /// outbox notifications in `change` are recorded in the same database transaction.
    ///
    /// Returns the updated transaction, or `None` when the version check failed and nothing was written.
    async fn apply_status_change(
        &self,
        change: StatusChange,
    ) -> Result<Option<PaymentTransaction>, TransactionStoreError>;

    /// Appends an entry to the payment history without touching the transaction itself.
    async fn append_event(
        &self,
        code: &OrderCode,
        event: PaymentEvent,
    ) -> Result<PaymentEventRecord, TransactionStoreError>;

    /// Fetches transactions matching the filter, newest first.
    async fn fetch_transactions(
        &self,
        filter: TransactionQueryFilter,
    ) -> Result<Vec<PaymentTransaction>, TransactionStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum TransactionStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A transaction with order code {0} already exists")]
    DuplicateOrderCode(OrderCode),
    #[error("The transaction with order code {0} does not exist")]
    TransactionNotFound(OrderCode),
    #[error("Could not (de)serialize a stored value. {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for TransactionStoreError {
    fn from(e: sqlx::Error) -> Self {
        TransactionStoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for TransactionStoreError {
    fn from(e: serde_json::Error) -> Self {
        TransactionStoreError::SerializationError(e.to_string())
    }
}
