use actix_web::{http::StatusCode, test::TestRequest};
use checkout_engine::{
    db_types::{OrderCode, PaymentMethod, PaymentStatus},
    traits::{GatewayResponse, PaymentGatewayError, TransactionQueryFilter, TransactionStore},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use super::{
    helpers::{checkout_body, gateway, link_created, new_db, send},
    mocks::MockGateway,
};

fn post_checkout(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/api/payments/checkout").set_json(body)
}

#[actix_web::test]
async fn cod_checkout() {
    let db = new_db().await;
    let mut body = checkout_body("COD");
    body["orderCode"] = json!("ORDER-1717000000000123");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), post_checkout(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["paymentMethod"], "COD");
    assert_eq!(body["data"]["redirectToOrderDetail"], true);
    assert_eq!(body["data"]["orderCode"], "ORDER-1717000000000123");
    assert_eq!(body["data"]["amount"], 150000);
    assert!(body["data"].get("paymentUrl").is_none());

    let tx = db.fetch_transaction(&OrderCode::from("ORDER-1717000000000123")).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Pending);
    assert_eq!(tx.payment_method, PaymentMethod::Cod);
    assert_eq!(body["data"]["transactionId"], tx.id);
}

#[actix_web::test]
async fn bank_checkout_returns_the_gateway_url() {
    let db = new_db().await;
    let mut gw = gateway();
    gw.expect_create_payment_link()
        .times(1)
        .returning(|req| Ok(link_created(&format!("https://pay.payos.vn/web/{}", req.order_code))));
    let (status, body) = send(&db, gw, MockGateway::new(), post_checkout(checkout_body("BANK"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["paymentMethod"], "BANK");
    let code = body["data"]["orderCode"].as_str().expect("an order code is generated").to_string();
    assert_eq!(body["data"]["paymentUrl"], format!("https://pay.payos.vn/web/{code}"));
    let tx = db.fetch_transaction(&OrderCode::from(code.as_str())).await.unwrap().unwrap();
    assert_eq!(tx.payment_url.as_deref(), body["data"]["paymentUrl"].as_str());
}

#[actix_web::test]
async fn unsupported_payment_method() {
    let db = new_db().await;
    let req = post_checkout(checkout_body("CREDIT_CARD"));
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "validation");
    let all = db.fetch_transactions(TransactionQueryFilter::default()).await.unwrap();
    assert!(all.is_empty());
}

#[actix_web::test]
async fn missing_customer_info() {
    let db = new_db().await;
    let mut body = checkout_body("COD");
    body.as_object_mut().unwrap().remove("customerInfo");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), post_checkout(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn malformed_body() {
    let db = new_db().await;
    let req = TestRequest::post()
        .uri("/api/payments/checkout")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"amount\": ");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn gateway_rejection_is_passed_on() {
    let db = new_db().await;
    let mut gw = gateway();
    gw.expect_create_payment_link().returning(|_| {
        Ok(GatewayResponse::rejected("Số tiền không hợp lệ", json!({"code": "20", "desc": "Số tiền không hợp lệ"})))
    });
    let (status, body) = send(&db, gw, MockGateway::new(), post_checkout(checkout_body("BANK"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "gateway_rejected");
    assert_eq!(body["error"]["code"], "20");
    assert!(db.fetch_transactions(TransactionQueryFilter::default()).await.unwrap().is_empty());
}

#[actix_web::test]
async fn unreachable_gateway_is_a_server_error() {
    let db = new_db().await;
    let mut gw = gateway();
    gw.expect_create_payment_link().returning(|_| Err(PaymentGatewayError::Unavailable("timed out".into())));
    let (status, body) = send(&db, gw, MockGateway::new(), post_checkout(checkout_body("BANK"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "gateway_unavailable");
}

#[actix_web::test]
async fn missing_checkout_url_is_a_server_error() {
    let db = new_db().await;
    let mut gw = gateway();
    gw.expect_create_payment_link()
        .returning(|_| Ok(GatewayResponse::accepted("success", json!({"code": "00", "data": {}}))));
    let (status, body) = send(&db, gw, MockGateway::new(), post_checkout(checkout_body("BANK"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "missing_checkout_url");
    assert_eq!(body["error"]["code"], "00");
}

#[actix_web::test]
async fn duplicate_order_code() {
    let db = new_db().await;
    let mut body = checkout_body("COD");
    body["orderCode"] = json!("ORDER-1717000000000999");
    let (status, _) = send(&db, MockGateway::new(), MockGateway::new(), post_checkout(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), post_checkout(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate_order_code");
}

#[actix_web::test]
async fn bearer_header_attributes_the_checkout() {
    let db = new_db().await;
    let claims = json!({"sub": "reader@example.com", "userId": "42", "role": [{"authority": "ROLE_USER"}]});
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"unknown-key")).unwrap();
    let req = post_checkout(checkout_body("COD")).insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    let code = OrderCode::from(body["data"]["orderCode"].as_str().unwrap());
    let tx = db.fetch_transaction(&code).await.unwrap().unwrap();
    assert_eq!(tx.user_id, Some(42));
}

#[actix_web::test]
async fn garbage_token_means_anonymous() {
    let db = new_db().await;
    let mut body = checkout_body("COD");
    body["token"] = json!("not-a-jwt");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), post_checkout(body)).await;
    assert_eq!(status, StatusCode::OK);
    let code = OrderCode::from(body["data"]["orderCode"].as_str().unwrap());
    assert_eq!(db.fetch_transaction(&code).await.unwrap().unwrap().user_id, None);
}

#[actix_web::test]
async fn direct_payment_link() {
    let db = new_db().await;
    let mut gw = gateway();
    gw.expect_create_payment_link().times(1).returning(|_| Ok(link_created("https://pay.payos.vn/web/direct")));
    let req = TestRequest::post().uri("/api/payments/create").set_json(json!({
        "orderCode": "1717000000000777",
        "amount": 99000,
        "description": "Sach giao khoa",
        "customerName": "Lê Thị C"
    }));
    let (status, body) = send(&db, gw, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["paymentUrl"], "https://pay.payos.vn/web/direct");
    assert_eq!(body["orderCode"], "1717000000000777");
    let tx = db.fetch_transaction(&OrderCode::from("1717000000000777")).await.unwrap().unwrap();
    assert_eq!(tx.payment_method, PaymentMethod::Payos);
    assert_eq!(body["transactionId"], tx.id);
}
