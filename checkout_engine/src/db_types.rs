//! Data types persisted by the transaction store.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use bks_common::Vnd;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderCode       ---------------------------------------------------------
/// The business key of a payment transaction. Every lookup from outside the service uses this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderCode(pub String);

impl OrderCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderCode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order code cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Checkout has been initiated and no final outcome is known yet.
    Pending,
    /// The payment has been received (or, for COD, confirmed by an admin).
    Paid,
    /// The gateway reported that the payment failed or expired.
    Failed,
    /// The payment was cancelled by the customer, an admin, or the gateway.
    Cancelled,
    /// The outcome could not be determined. This is a transient signal and is never persisted.
    Unknown,
}

impl PaymentStatus {
    /// Maps a status string reported by the gateway onto the local state machine. Anything unrecognised becomes
    /// [`PaymentStatus::Unknown`], which leaves the stored status untouched.
    pub fn from_gateway(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "PAID" => Self::Paid,
            "PENDING" | "PROCESSING" => Self::Pending,
            "CANCELLED" | "CANCELED" => Self::Cancelled,
            "FAILED" | "EXPIRED" => Self::Failed,
            other => {
                debug!("Unrecognised gateway status '{other}'");
                Self::Unknown
            },
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "UNKNOWN" => Ok(Self::Unknown),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash on delivery. No gateway interaction.
    Cod,
    /// Bank transfer through a gateway payment link, initiated from checkout.
    Bank,
    /// A payment link created directly, without an order-service order.
    Payos,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "COD"),
            Self::Bank => write!(f, "BANK"),
            Self::Payos => write!(f, "PAYOS"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "BANK" => Ok(Self::Bank),
            "PAYOS" => Ok(Self::Payos),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------     CustomerInfo      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

//--------------------------------------       LineItem        ---------------------------------------------------------
/// A purchased item as sent by the storefront. Fields the service does not interpret are preserved in `extra` so
/// that the order service receives the items exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub price: Vnd,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_quantity() -> i64 {
    1
}

impl LineItem {
    pub fn new<S: Into<String>>(id: Value, title: S, quantity: i64, price: Vnd) -> Self {
        Self { id: Some(id), book_title: Some(title.into()), quantity, price, ..Default::default() }
    }

    /// The label shown to the buyer. Book titles win over generic names.
    pub fn display_name(&self) -> String {
        self.book_title
            .as_ref()
            .or(self.name.as_ref())
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "Item".to_string())
    }

    /// The product identifier used by the cart service
    pub fn product_id(&self) -> Option<Value> {
        self.id
            .clone()
            .or_else(|| self.extra.get("productId").cloned())
            .or_else(|| self.extra.get("bookId").cloned())
            .filter(|v| !v.is_null())
    }
}

//--------------------------------------  PaymentTransaction   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: i64,
    pub order_code: OrderCode,
    /// The numeric form of the order code that the gateway knows this transaction by
    pub gateway_code: Option<i64>,
    pub user_id: Option<i64>,
    pub amount: Vnd,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_url: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Optimistic-lock counter. Incremented on every status write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------- NewPaymentTransaction ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub order_code: OrderCode,
    pub gateway_code: Option<i64>,
    pub user_id: Option<i64>,
    pub amount: Vnd,
    pub payment_method: PaymentMethod,
    pub payment_url: Option<String>,
    pub description: Option<String>,
    pub customer: CustomerInfo,
    /// History records written together with the transaction
    pub events: Vec<PaymentEvent>,
    /// Cross-service notifications written to the outbox together with the transaction
    pub notifications: Vec<Notification>,
}

impl NewPaymentTransaction {
    pub fn new(order_code: OrderCode, amount: Vnd, payment_method: PaymentMethod) -> Self {
        Self {
            order_code,
            gateway_code: None,
            user_id: None,
            amount,
            payment_method,
            payment_url: None,
            description: None,
            customer: CustomerInfo::default(),
            events: vec![],
            notifications: vec![],
        }
    }

    pub fn with_user_id(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_gateway_code(mut self, code: Option<i64>) -> Self {
        self.gateway_code = code;
        self
    }

    pub fn with_payment_url(mut self, url: Option<String>) -> Self {
        self.payment_url = url;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_customer(mut self, customer: CustomerInfo) -> Self {
        self.customer = customer;
        self
    }

    pub fn with_event(mut self, event: PaymentEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }
}

//--------------------------------------     PaymentEvent      ---------------------------------------------------------
/// One entry of a transaction's payment history. The history is append-only and ordered by insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaymentEvent {
    /// What the customer submitted at checkout
    #[serde(rename_all = "camelCase")]
    CheckoutSnapshot {
        items: Vec<LineItem>,
        customer_info: CustomerInfo,
        #[serde(default)]
        shipping_address: Option<Value>,
        #[serde(default)]
        note: Option<String>,
    },
    /// The gateway's answer to the payment-link request
    GatewayResponse { response: Value },
    /// A status poll answered by the gateway
    StatusCheck { response: Value },
    /// A verified webhook payload
    Webhook { payload: Value },
    /// An admin confirmed the payment
    #[serde(rename_all = "camelCase")]
    AdminConfirmed {
        #[serde(default)]
        gateway_response: Option<Value>,
    },
    /// The payment was cancelled locally
    #[serde(rename_all = "camelCase")]
    Cancelled {
        reason: String,
        #[serde(default)]
        gateway_response: Option<Value>,
    },
}

impl PaymentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CheckoutSnapshot { .. } => "checkoutSnapshot",
            Self::GatewayResponse { .. } => "gatewayResponse",
            Self::StatusCheck { .. } => "statusCheck",
            Self::Webhook { .. } => "webhook",
            Self::AdminConfirmed { .. } => "adminConfirmed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEventRecord {
    pub id: i64,
    pub order_code: OrderCode,
    pub event: PaymentEvent,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  NotificationTarget   ---------------------------------------------------------
/// The downstream endpoint a notification is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum NotificationTarget {
    /// `POST {order service}/api/orders`
    CreateOrder,
    /// `POST {order service}/api/orders/payment-completed`
    PaymentCompleted,
    /// `POST {order service}/api/orders/payment-failed`
    PaymentFailed,
    /// `POST {order service}/api/orders/cancel-order`
    CancelOrder,
    /// `POST {cart service}/api/cart/checkout`
    CartCheckout,
}

impl Display for NotificationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateOrder => write!(f, "CreateOrder"),
            Self::PaymentCompleted => write!(f, "PaymentCompleted"),
            Self::PaymentFailed => write!(f, "PaymentFailed"),
            Self::CancelOrder => write!(f, "CancelOrder"),
            Self::CartCheckout => write!(f, "CartCheckout"),
        }
    }
}

//--------------------------------------     Notification      ---------------------------------------------------------
/// A notification that still has to be written to the outbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub target: NotificationTarget,
    pub payload: Value,
}

impl Notification {
    pub fn payment_completed(order_code: &OrderCode) -> Self {
        Self { target: NotificationTarget::PaymentCompleted, payload: json!({ "orderCode": order_code }) }
    }

    pub fn payment_failed(order_code: &OrderCode) -> Self {
        Self { target: NotificationTarget::PaymentFailed, payload: json!({ "orderCode": order_code }) }
    }

    pub fn cancel_order(order_code: &OrderCode, reason: &str) -> Self {
        Self { target: NotificationTarget::CancelOrder, payload: json!({ "orderCode": order_code, "reason": reason }) }
    }

    pub fn cart_checkout(user_id: i64, product_ids: Vec<Value>) -> Self {
        Self { target: NotificationTarget::CartCheckout, payload: json!({ "userId": user_id, "productIds": product_ids }) }
    }

    pub fn create_order(payload: Value) -> Self {
        Self { target: NotificationTarget::CreateOrder, payload }
    }
}

//--------------------------------------     OutboxStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Waiting for (re)delivery
    Pending,
    /// Claimed by a dispatcher
    Processing,
    Delivered,
    /// Gave up after too many attempts. Kept for manual reconciliation.
    Dead,
}

impl Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Dead => write!(f, "Dead"),
        }
    }
}

//--------------------------------------     OutboxMessage     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub id: i64,
    pub order_code: OrderCode,
    pub target: NotificationTarget,
    pub payload: Value,
    pub status: OutboxStatus,
    pub attempts: i64,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
