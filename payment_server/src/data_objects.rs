use std::fmt::Display;

use chrono::{DateTime, Utc};
use checkout_engine::{
    db_types::{OrderCode, PaymentStatus, PaymentTransaction, Vnd},
    payment_objects::PaymentStatusResult,
};
use serde::{Deserialize, Serialize};

pub const CACHED_STATUS_MESSAGE: &str = "Status taken from the database, could not reach the payment gateway";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Successful response that wraps a payload under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new<S: Display>(message: S, data: T) -> Self {
        Self { success: true, message: message.to_string(), data }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuery {
    pub order_code: Option<String>,
    /// Echoed by the gateway's return page. It is informational only; the gateway is always asked for the status.
    pub result_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelParams {
    #[serde(default, alias = "cancelReason")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub status: Option<PaymentStatus>,
    pub limit: Option<i64>,
}

/// The slice of a transaction shown on the storefront's payment result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: i64,
    pub order_code: OrderCode,
    pub amount: Vnd,
    pub status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
}

impl From<&PaymentTransaction> for TransactionSummary {
    fn from(tx: &PaymentTransaction) -> Self {
        Self {
            id: tx.id,
            order_code: tx.order_code.clone(),
            amount: tx.amount,
            status: tx.status,
            payment_date: tx.payment_date,
            customer_name: tx.customer_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResultResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub order_code: OrderCode,
    pub status: PaymentStatus,
    pub from_cache: bool,
    pub transaction: TransactionSummary,
}

impl From<PaymentStatusResult> for PaymentResultResponse {
    fn from(result: PaymentStatusResult) -> Self {
        let message = result.from_cache.then(|| CACHED_STATUS_MESSAGE.to_string());
        Self {
            success: true,
            message,
            order_code: result.transaction.order_code.clone(),
            status: result.status(),
            from_cache: result.from_cache,
            transaction: TransactionSummary::from(&result.transaction),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderActionResponse {
    pub success: bool,
    pub message: String,
    pub order_code: OrderCode,
    pub status: PaymentStatus,
}

impl OrderActionResponse {
    pub fn new<S: Display>(message: S, tx: &PaymentTransaction) -> Self {
        Self { success: true, message: message.to_string(), order_code: tx.order_code.clone(), status: tx.status }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub success: bool,
    pub transactions: Vec<PaymentTransaction>,
}
