use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    db_types::OrderCode,
    traits::{OutboxError, PaymentGatewayError, TransactionStoreError},
};

/// A coarse classification of [`PaymentFlowError`], stable enough to be shown to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    GatewayRejected,
    InvalidSignature,
    TransactionNotFound,
    DuplicateOrderCode,
    ConcurrentModification,
    MissingCheckoutUrl,
    GatewayUnavailable,
    Database,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::GatewayRejected => "gateway_rejected",
            Self::InvalidSignature => "invalid_signature",
            Self::TransactionNotFound => "transaction_not_found",
            Self::DuplicateOrderCode => "duplicate_order_code",
            Self::ConcurrentModification => "concurrent_modification",
            Self::MissingCheckoutUrl => "missing_checkout_url",
            Self::GatewayUnavailable => "gateway_unavailable",
            Self::Database => "database",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("{0}")]
    Validation(String),
    #[error("The payment gateway declined the request. {message}")]
    GatewayRejected { message: String, response: Value },
    #[error("The webhook signature is invalid")]
    InvalidSignature,
    #[error("No payment transaction exists for order {0}")]
    TransactionNotFound(OrderCode),
    #[error("A payment transaction for order {0} already exists")]
    DuplicateOrderCode(OrderCode),
    #[error("Order {0} was modified by another request. Please try again.")]
    ConcurrentModification(OrderCode),
    #[error("The payment gateway did not return a checkout URL")]
    MissingCheckoutUrl { response: Value },
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("Database error. {0}")]
    Database(String),
}

impl PaymentFlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::GatewayRejected { .. } => ErrorKind::GatewayRejected,
            Self::InvalidSignature => ErrorKind::InvalidSignature,
            Self::TransactionNotFound(_) => ErrorKind::TransactionNotFound,
            Self::DuplicateOrderCode(_) => ErrorKind::DuplicateOrderCode,
            Self::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            Self::MissingCheckoutUrl { .. } => ErrorKind::MissingCheckoutUrl,
            Self::GatewayUnavailable(_) => ErrorKind::GatewayUnavailable,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// The raw gateway reply attached to the error, if there is one.
    pub fn gateway_response(&self) -> Option<&Value> {
        match self {
            Self::GatewayRejected { response, .. } | Self::MissingCheckoutUrl { response } => Some(response),
            _ => None,
        }
    }
}

impl From<TransactionStoreError> for PaymentFlowError {
    fn from(e: TransactionStoreError) -> Self {
        match e {
            TransactionStoreError::DuplicateOrderCode(code) => Self::DuplicateOrderCode(code),
            TransactionStoreError::TransactionNotFound(code) => Self::TransactionNotFound(code),
            e => Self::Database(e.to_string()),
        }
    }
}

impl From<PaymentGatewayError> for PaymentFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::Unavailable(s) => Self::GatewayUnavailable(s),
            PaymentGatewayError::InvalidRequest(s) => Self::Validation(s),
        }
    }
}

impl From<OutboxError> for PaymentFlowError {
    fn from(e: OutboxError) -> Self {
        Self::Database(e.to_string())
    }
}
