//! A small, signed REST client for the PayOS merchant API.
//!
//! [`PayosApi`] wraps the four endpoints the bookstore needs: create a payment link, check its status, confirm it
//! and cancel it. Request signing and webhook verification live in [`signature`].
mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;
pub mod signature;

pub use api::PayosApi;
pub use config::PayosConfig;
pub use data_objects::{
    BuyerInfo,
    CancelPaymentRequest,
    ConfirmPaymentRequest,
    PaymentItem,
    PaymentOrder,
    PaymentRequest,
    PayosResponse,
    SUCCESS_CODE,
};
pub use error::PayosApiError;
