use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{
    CustomerInfo,
    LineItem,
    Notification,
    OrderCode,
    PaymentEvent,
    PaymentMethod,
    PaymentStatus,
    Vnd,
};

/// A conditional status write. It only succeeds if the stored row still has `expected_version`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order_code: OrderCode,
    pub expected_version: i64,
    pub new_status: PaymentStatus,
    /// Set when the transaction enters PAID for the first time
    pub payment_date: Option<DateTime<Utc>>,
    /// History entry recorded together with the change
    pub event: PaymentEvent,
    /// Outbox entries recorded together with the change
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQueryFilter {
    pub user_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub limit: Option<i64>,
}

impl TransactionQueryFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.status.is_none()
            && self.payment_method.is_none()
    }
}

/// What the engine asks a gateway to open a payment link for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentLinkRequest {
    pub order_code: OrderCode,
    pub amount: Vnd,
    pub description: Option<String>,
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
}

/// A provider-neutral view of a gateway reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// The gateway accepted the call
    pub success: bool,
    /// The gateway's own description of the outcome
    pub message: String,
    pub checkout_url: Option<String>,
    /// The payment status as reported by the gateway, verbatim
    pub remote_status: Option<String>,
    /// The complete reply, for the payment history
    pub raw: Value,
}

impl GatewayResponse {
    pub fn accepted<S: Into<String>>(message: S, raw: Value) -> Self {
        Self { success: true, message: message.into(), raw, ..Default::default() }
    }

    pub fn rejected<S: Into<String>>(message: S, raw: Value) -> Self {
        Self { success: false, message: message.into(), raw, ..Default::default() }
    }

    pub fn with_checkout_url<S: Into<String>>(mut self, url: S) -> Self {
        self.checkout_url = Some(url.into());
        self
    }

    pub fn with_remote_status<S: Into<String>>(mut self, status: S) -> Self {
        self.remote_status = Some(status.into());
        self
    }
}
