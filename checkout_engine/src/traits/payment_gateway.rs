use serde_json::Value;
use thiserror::Error;

use crate::{
    db_types::OrderCode,
    traits::data_objects::{GatewayResponse, PaymentLinkRequest},
};

/// An external payment provider.
///
/// Calls return `Ok` whenever the gateway answered, even if it declined the request (`success == false`). `Err` is
/// reserved for cases where no usable answer was received at all.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Asks the gateway for a hosted payment page.
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<GatewayResponse, PaymentGatewayError>;

    /// Asks the gateway for its view of a payment.
    async fn fetch_payment_status(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError>;

    /// Informs the gateway that a payment has been accepted manually.
    async fn confirm_payment(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError>;

    async fn cancel_payment(&self, code: &OrderCode, reason: &str) -> Result<GatewayResponse, PaymentGatewayError>;

    /// Checks the signature carried by a webhook notification.
    fn verify_webhook(&self, payload: &Value, signature: &str) -> bool;

    /// The numeric code the gateway will use to refer to the given order code.
    fn gateway_code(&self, code: &OrderCode) -> Option<i64>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The request could not be sent to the payment gateway. {0}")]
    InvalidRequest(String),
}
