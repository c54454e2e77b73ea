use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use checkout_engine::{
    db_types::{
        CustomerInfo,
        LineItem,
        NewPaymentTransaction,
        OrderCode,
        PaymentEvent,
        PaymentMethod,
        PaymentTransaction,
        Vnd,
    },
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{GatewayResponse, TransactionStore},
    CheckoutApi,
    ReconciliationApi,
    SqliteDatabase,
};
use log::debug;
use serde_json::{json, Value};

use super::mocks::MockGateway;
use crate::{
    helpers::{json_config, path_config, query_config},
    routes::{
        CancelPaymentRoute,
        CheckoutRoute,
        ConfirmPaymentRoute,
        CreatePaymentRoute,
        PaymentDetailsRoute,
        PaymentResultRoute,
        PaymentStatusRoute,
        PayosWebhookRoute,
        TransactionsRoute,
        UserTransactionsRoute,
    },
};

pub async fn new_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

/// A gateway mock with no expectations beyond deriving gateway codes. Any unexpected call fails the test.
pub fn gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_gateway_code().returning(|code| code.as_str().trim_start_matches("ORDER-").parse().ok());
    gateway
}

/// Sends `req` to an app with every payment route mounted under `/api/payments`.
///
/// `checkout_gateway` backs the checkout routes and `reconciliation_gateway` everything else.
pub async fn send(
    db: &SqliteDatabase,
    checkout_gateway: MockGateway,
    reconciliation_gateway: MockGateway,
    req: TestRequest,
) -> (StatusCode, Value) {
    let checkout_api = CheckoutApi::new(db.clone(), checkout_gateway, EventProducers::default());
    let reconciliation_api = ReconciliationApi::new(db.clone(), reconciliation_gateway, EventProducers::default());
    let scope = web::scope("/api/payments")
        .service(CheckoutRoute::<SqliteDatabase, MockGateway>::new())
        .service(CreatePaymentRoute::<SqliteDatabase, MockGateway>::new())
        .service(PaymentResultRoute::<SqliteDatabase, MockGateway>::new())
        .service(PaymentStatusRoute::<SqliteDatabase, MockGateway>::new())
        .service(PaymentDetailsRoute::<SqliteDatabase, MockGateway>::new())
        .service(CancelPaymentRoute::<SqliteDatabase, MockGateway>::new())
        .service(ConfirmPaymentRoute::<SqliteDatabase, MockGateway>::new())
        .service(PayosWebhookRoute::<SqliteDatabase, MockGateway>::new())
        .service(TransactionsRoute::<SqliteDatabase, MockGateway>::new())
        .service(UserTransactionsRoute::<SqliteDatabase, MockGateway>::new());
    let app = App::new()
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(web::Data::new(checkout_api))
        .app_data(web::Data::new(reconciliation_api))
        .service(scope);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
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

pub fn checkout_body(method: &str) -> Value {
    json!({
        "amount": 150000,
        "shippingAddress": {"street": "12 Lý Thường Kiệt", "city": "Hà Nội"},
        "customerInfo": {"fullName": "Nguyễn Văn A", "email": "a@example.com", "phone": "0901234567"},
        "items": [
            {"id": 11, "bookTitle": "Số Đỏ", "quantity": 1, "price": 90000},
            {"id": 12, "bookTitle": "Dế Mèn Phiêu Lưu Ký", "quantity": 2, "price": 30000}
        ],
        "paymentMethod": method,
    })
}

pub fn link_created(url: &str) -> GatewayResponse {
    let raw = json!({"code": "00", "desc": "success", "data": {"checkoutUrl": url, "status": "PENDING"}});
    GatewayResponse::accepted("success", raw).with_checkout_url(url)
}

pub fn remote_status(status: &str) -> GatewayResponse {
    let raw = json!({"code": "00", "desc": "success", "data": {"status": status}});
    GatewayResponse::accepted("success", raw).with_remote_status(status)
}

/// Stores a PENDING bank transaction of 150 000 VND, bypassing the checkout flow.
pub async fn seed_transaction(db: &SqliteDatabase, code: &str, user_id: Option<i64>) -> PaymentTransaction {
    let code = OrderCode::from(code);
    let snapshot =
        PaymentEvent::CheckoutSnapshot { items: books(), customer_info: customer(), shipping_address: None, note: None };
    let tx = NewPaymentTransaction::new(code.clone(), Vnd::from(150_000), PaymentMethod::Bank)
        .with_user_id(user_id)
        .with_gateway_code(code.as_str().parse().ok())
        .with_payment_url(Some(format!("https://pay.payos.vn/web/{code}")))
        .with_customer(customer())
        .with_event(snapshot);
    db.insert_transaction(tx).await.expect("Failed to seed transaction")
}
