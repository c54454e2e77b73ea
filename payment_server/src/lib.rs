//! # Bookstore payment server
//! This crate hosts the HTTP front end of the bookstore payment service. It is responsible for:
//! * Accepting storefront checkouts and opening PayOS payment links for bank payments.
//! * Receiving PayOS webhooks and answering status polls from the payment result page.
//! * Running the outbox worker that delivers order and cart notifications.
//!
//! The business rules live in `checkout_engine`; this crate only wires them to HTTP, PayOS and the downstream
//! services.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! All payment routes are mounted under `/api/payments`:
//! * `POST /checkout`, `POST /create`: start a payment.
//! * `GET /result`, `GET /status/{orderCode}`: reconcile with the gateway and report the status.
//! * `POST /cancel/{orderCode}`, `POST /confirm/{orderCode}`: manual actions.
//! * `GET /details/{orderCode}`, `GET /transactions`, `GET /transactions/user/{userId}`: read-only views.
//! * `POST /payos/webhook`: PayOS payment notifications.
//!
//! `/health` is served from the root.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod outbox_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
