#![allow(dead_code)]
use checkout_engine::{
    db_types::{
        CustomerInfo,
        LineItem,
        NewPaymentTransaction,
        NotificationTarget,
        OrderCode,
        PaymentEvent,
        PaymentMethod,
        PaymentTransaction,
        Vnd,
    },
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{
        GatewayResponse,
        NotifyError,
        PaymentGateway,
        PaymentGatewayError,
        PaymentLinkRequest,
        TransactionStore,
        Notifier,
    },
    SqliteDatabase,
};
use mockall::mock;
use serde_json::{json, Value};

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<GatewayResponse, PaymentGatewayError>;
        async fn fetch_payment_status(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError>;
        async fn confirm_payment(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError>;
        async fn cancel_payment(&self, code: &OrderCode, reason: &str) -> Result<GatewayResponse, PaymentGatewayError>;
        fn verify_webhook(&self, payload: &Value, signature: &str) -> bool;
        fn gateway_code(&self, code: &OrderCode) -> Option<i64>;
    }
}

mock! {
    pub Downstream {}
    impl Clone for Downstream {
        fn clone(&self) -> Self;
    }
    impl Notifier for Downstream {
        async fn deliver(&self, target: NotificationTarget, payload: &Value) -> Result<(), NotifyError>;
    }
}

pub async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub fn numeric_code(code: &OrderCode) -> Option<i64> {
    code.as_str().trim_start_matches("ORDER-").parse().ok()
}

/// A gateway mock that only knows how to derive gateway codes. Add further expectations as needed.
pub fn gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_gateway_code().returning(numeric_code);
    gateway
}

/// A gateway that rejects every outbound call with a transport failure.
pub fn unreachable_gateway() -> MockGateway {
    let mut gateway = gateway();
    gateway
        .expect_fetch_payment_status()
        .returning(|_| Err(PaymentGatewayError::Unavailable("connection refused".into())));
    gateway.expect_confirm_payment().returning(|_| Err(PaymentGatewayError::Unavailable("connection refused".into())));
    gateway
        .expect_cancel_payment()
        .returning(|_, _| Err(PaymentGatewayError::Unavailable("connection refused".into())));
    gateway
}

pub fn link_created(url: &str) -> GatewayResponse {
    let raw = json!({"code": "00", "desc": "success", "data": {"checkoutUrl": url, "status": "PENDING"}});
    GatewayResponse::accepted("success", raw).with_checkout_url(url)
}

pub fn remote_status(status: &str) -> GatewayResponse {
    let raw = json!({"code": "00", "desc": "success", "data": {"status": status}});
    GatewayResponse::accepted("success", raw).with_remote_status(status)
}

pub fn books() -> Vec<LineItem> {
    vec![
        LineItem::new(json!(11), "Số Đỏ", 1, Vnd::from(90_000)),
        LineItem::new(json!(12), "Dế Mèn Phiêu Lưu Ký", 2, Vnd::from(30_000)),
    ]
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        full_name: Some("Nguyễn Văn A".into()),
        email: Some("a@example.com".into()),
        phone: Some("0901234567".into()),
    }
}

/// Stores a PENDING transaction with a checkout snapshot, bypassing the checkout flow.
pub async fn seed_transaction(
    db: &SqliteDatabase,
    code: &str,
    method: PaymentMethod,
    user_id: Option<i64>,
) -> PaymentTransaction {
    let code = OrderCode::from(code);
    let snapshot =
        PaymentEvent::CheckoutSnapshot { items: books(), customer_info: customer(), shipping_address: None, note: None };
    let tx = NewPaymentTransaction::new(code.clone(), Vnd::from(150_000), method)
        .with_user_id(user_id)
        .with_gateway_code(numeric_code(&code))
        .with_customer(customer())
        .with_event(snapshot);
    db.insert_transaction(tx).await.expect("Failed to seed transaction")
}

pub fn webhook(code: Value, status: &str) -> Value {
    json!({
        "code": "00",
        "desc": "success",
        "success": true,
        "data": { "orderCode": code, "amount": 150000, "status": status, "reference": "FT2401" }
    })
}
