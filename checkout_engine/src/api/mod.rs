//! # Checkout engine public API
//!
//! * [`checkout_api`] turns storefront checkouts into payment transactions.
//! * [`reconciliation_api`] applies webhook, poll and admin signals to the payment state machine.
//! * [`outbox_api`] delivers the cross-service notifications recorded by the other two.
//!
//! Each API is created from the backends it needs:
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url(url, 5).await?;
//! let api = CheckoutApi::new(db, gateway, producers);
//! let result = api.checkout(request).await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod outbox_api;
pub mod payment_objects;
pub mod reconciliation_api;
