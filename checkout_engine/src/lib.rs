//! Checkout Engine
//!
//! The checkout engine is the provider-agnostic core of the bookstore payment service. It turns storefront checkouts
//! into payment transactions, reconciles them with what the payment gateway reports, and makes sure the order and
//! cart services hear about every outcome.
//!
//! The library is divided into three sections:
//! 1. Storage ([`mod@db`]). SQLite is the supported backend. Callers should not touch the database directly; the
//!    data types it stores live in [`db_types`] and are public.
//! 2. Backend contracts ([`traits`]). Storage, the payment gateway and the downstream notifier are all reached through
//!    these traits, so each can be replaced (or mocked).
//! 3. The public API: [`CheckoutApi`], [`ReconciliationApi`] and [`OutboxApi`].
//!
//! The engine also publishes events after every committed change. See [`events`] for how to subscribe.
mod api;
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    checkout_api::CheckoutApi,
    errors::{ErrorKind, PaymentFlowError},
    outbox_api::{backoff, DispatchSummary, OutboxApi, OutboxConfig},
    payment_objects,
    reconciliation_api::{ReconciliationApi, DEFAULT_CANCEL_REASON, GATEWAY_CANCEL_REASON, MAX_CAS_ATTEMPTS},
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
