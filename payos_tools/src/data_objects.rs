use bks_common::Vnd;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PayosApiError;

/// The code the gateway uses for a successful call.
pub const SUCCESS_CODE: &str = "00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub name: String,
    pub quantity: i64,
    pub price: Vnd,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Everything needed to open a payment link for an order.
#[derive(Debug, Clone, Default)]
pub struct PaymentOrder {
    /// The local order code. It is converted to the numeric gateway form before sending.
    pub order_code: String,
    pub amount: Vnd,
    pub description: Option<String>,
    pub buyer: BuyerInfo,
    pub items: Vec<PaymentItem>,
    /// Overrides the configured return URL
    pub return_url: Option<String>,
    /// Overrides the configured cancel URL
    pub cancel_url: Option<String>,
}

/// The wire format of `POST /v2/payment-requests`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_code: i64,
    pub amount: Vnd,
    pub description: String,
    pub cancel_url: String,
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_phone: Option<String>,
    pub expired_at: i64,
    pub webhook_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PaymentItem>,
}

impl PaymentRequest {
    /// The part of the request covered by the checksum. The gateway leaves `items` out of the signing scope.
    pub fn signing_payload(&self) -> Result<Value, PayosApiError> {
        let mut value = serde_json::to_value(self).map_err(|e| PayosApiError::JsonError(e.to_string()))?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("items");
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub order_code: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPaymentRequest {
    pub order_code: i64,
    pub cancel_reason: String,
}

/// The standard response envelope returned by every gateway endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayosResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl PayosResponse {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    pub fn checkout_url(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d["checkoutUrl"].as_str()).filter(|s| !s.is_empty())
    }

    /// The payment status reported by the gateway, e.g. `PAID`, `PENDING` or `CANCELLED`
    pub fn status(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d["status"].as_str())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
