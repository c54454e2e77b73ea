//! # Backend contracts
//!
//! The engine is provider-agnostic. Storage, the payment gateway and the downstream services are all reached through
//! the traits defined here.
//!
//! * [`TransactionStore`] persists payment transactions and their append-only payment history. Every write that
//!   should cause a cross-service notification records that notification in the outbox in the same database
//!   transaction.
//! * [`OutboxManagement`] gives the dispatcher access to those outbox entries.
//! * [`PaymentGateway`] is the external provider that hosts payment links and reports payment outcomes.
//! * [`Notifier`] delivers one outbox entry to the order or cart service.
mod data_objects;
mod notifier;
mod outbox_management;
mod payment_gateway;
mod transaction_store;

pub use data_objects::{GatewayResponse, PaymentLinkRequest, StatusChange, TransactionQueryFilter};
pub use notifier::{Notifier, NotifyError};
pub use outbox_management::{OutboxError, OutboxManagement, RetryUpdate};
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};
pub use transaction_store::{TransactionStore, TransactionStoreError};
