use crate::db_types::{PaymentStatus, PaymentTransaction};

/// Published after a new transaction (and its outbox notifications) has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCreatedEvent {
    pub transaction: PaymentTransaction,
}

impl TransactionCreatedEvent {
    pub fn new(transaction: PaymentTransaction) -> Self {
        Self { transaction }
    }
}

/// Published after a status transition has been committed. Only emitted when the status actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusChangedEvent {
    pub transaction: PaymentTransaction,
    pub old_status: PaymentStatus,
}

impl PaymentStatusChangedEvent {
    pub fn new(transaction: PaymentTransaction, old_status: PaymentStatus) -> Self {
        Self { transaction, old_status }
    }

    pub fn new_status(&self) -> PaymentStatus {
        self.transaction.status
    }
}
