use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{
    CustomerInfo,
    LineItem,
    OrderCode,
    PaymentEventRecord,
    PaymentMethod,
    PaymentStatus,
    PaymentTransaction,
    Vnd,
};

/// A storefront checkout, as submitted by the client.
///
/// Everything is optional at this level so that missing fields surface as validation errors rather than as
/// deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub amount: Option<Vnd>,
    #[serde(default)]
    pub shipping_address: Option<Value>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Bearer token of the shopper. Only used to attribute the transaction to a user.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_code: OrderCode,
    pub transaction_id: i64,
    pub payment_method: PaymentMethod,
    pub amount: Vnd,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    /// COD checkouts are complete as far as the storefront is concerned. It should show the order page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to_order_detail: Option<bool>,
}

impl CheckoutResult {
    pub fn for_cash_on_delivery(tx: &PaymentTransaction) -> Self {
        Self {
            order_code: tx.order_code.clone(),
            transaction_id: tx.id,
            payment_method: tx.payment_method,
            amount: tx.amount,
            payment_url: None,
            redirect_to_order_detail: Some(true),
        }
    }

    pub fn for_payment_link(tx: &PaymentTransaction) -> Self {
        Self {
            order_code: tx.order_code.clone(),
            transaction_id: tx.id,
            payment_method: tx.payment_method,
            amount: tx.amount,
            payment_url: tx.payment_url.clone(),
            redirect_to_order_detail: None,
        }
    }
}

/// A direct payment-link request that bypasses the order service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub amount: Option<Vnd>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl CreatePaymentRequest {
    pub fn customer(&self) -> CustomerInfo {
        CustomerInfo {
            full_name: self.customer_name.clone(),
            email: self.customer_email.clone(),
            phone: self.customer_phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResult {
    pub order_code: OrderCode,
    pub transaction_id: i64,
    pub payment_url: Option<String>,
    pub amount: Vnd,
}

/// The outcome of a status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusResult {
    pub transaction: PaymentTransaction,
    /// True when the gateway could not provide a usable answer and the stored status is reported instead
    pub from_cache: bool,
}

impl PaymentStatusResult {
    pub fn status(&self) -> PaymentStatus {
        self.transaction.status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A transaction together with its full payment history, as shown to the storefront and to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub id: i64,
    pub order_code: OrderCode,
    pub user_id: Option<i64>,
    pub status: PaymentStatus,
    pub amount: Vnd,
    pub payment_method: PaymentMethod,
    pub payment_url: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub customer_info: CustomerContact,
    pub details: Vec<PaymentEventRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentDetails {
    pub fn new(tx: PaymentTransaction, details: Vec<PaymentEventRecord>) -> Self {
        Self {
            id: tx.id,
            order_code: tx.order_code,
            user_id: tx.user_id,
            status: tx.status,
            amount: tx.amount,
            payment_method: tx.payment_method,
            payment_url: tx.payment_url,
            payment_date: tx.payment_date,
            description: tx.description,
            customer_info: CustomerContact {
                name: tx.customer_name,
                email: tx.customer_email,
                phone: tx.customer_phone,
            },
            details,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}
