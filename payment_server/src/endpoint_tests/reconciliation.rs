use actix_web::{http::StatusCode, test::TestRequest};
use checkout_engine::{
    db_types::{NotificationTarget, OrderCode, PaymentStatus},
    traits::{GatewayResponse, OutboxManagement, PaymentGatewayError, TransactionStore},
};
use serde_json::{json, Value};

use super::{
    helpers::{gateway, new_db, remote_status, seed_transaction, send},
    mocks::MockGateway,
};
use crate::data_objects::CACHED_STATUS_MESSAGE;

const CODE: &str = "1718000000000001";

fn webhook(status: &str) -> Value {
    json!({
        "code": "00",
        "desc": "success",
        "success": true,
        "data": { "orderCode": CODE.parse::<i64>().unwrap(), "amount": 150000, "status": status },
        "signature": "ignored-by-the-mock"
    })
}

fn signed_webhook(status: &str, valid: bool) -> (MockGateway, TestRequest) {
    let mut gw = gateway();
    gw.expect_verify_webhook().withf(|_, sig| sig.contains("abc123")).returning(move |_, _| valid);
    let req = TestRequest::post()
        .uri("/api/payments/payos/webhook")
        .insert_header(("x-signature", "abc123"))
        .set_json(webhook(status));
    (gw, req)
}

async fn stored_status(db: &checkout_engine::SqliteDatabase) -> PaymentStatus {
    db.fetch_transaction(&OrderCode::from(CODE)).await.unwrap().unwrap().status
}

//----------------------------------------------   Result  ----------------------------------------------------
#[actix_web::test]
async fn result_needs_an_order_code() {
    let db = new_db().await;
    let req = TestRequest::get().uri("/api/payments/result?resultCode=00");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn result_for_unknown_order() {
    let db = new_db().await;
    let req = TestRequest::get().uri("/api/payments/result?orderCode=999&resultCode=00");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "transaction_not_found");
}

#[actix_web::test]
async fn result_marks_paid_orders() {
    let db = new_db().await;
    let seeded = seed_transaction(&db, CODE, Some(7)).await;
    let mut gw = gateway();
    gw.expect_fetch_payment_status().times(1).returning(|_| Ok(remote_status("PAID")));
    let req = TestRequest::get().uri(&format!("/api/payments/result?orderCode={CODE}&resultCode=00"));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["orderCode"], CODE);
    assert_eq!(body["status"], "PAID");
    assert_eq!(body["fromCache"], false);
    assert_eq!(body["transaction"]["id"], seeded.id);
    assert_eq!(body["transaction"]["amount"], 150000);
    assert_eq!(body["transaction"]["customerName"], "Nguyễn Văn A");
    assert!(body["transaction"]["paymentDate"].is_string());

    let outbox = db.fetch_outbox_for_order(&OrderCode::from(CODE)).await.unwrap();
    let targets = outbox.iter().map(|m| m.target).collect::<Vec<_>>();
    assert_eq!(targets, vec![NotificationTarget::PaymentCompleted, NotificationTarget::CartCheckout]);
}

#[actix_web::test]
async fn result_falls_back_to_the_stored_status() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_fetch_payment_status().returning(|_| Err(PaymentGatewayError::Unavailable("connection reset".into())));
    let req = TestRequest::get().uri(&format!("/api/payments/result?orderCode={CODE}"));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["fromCache"], true);
    assert_eq!(body["message"], CACHED_STATUS_MESSAGE);
    let events = db.fetch_payment_events(&OrderCode::from(CODE)).await.unwrap();
    assert_eq!(events.len(), 1, "a failed poll records nothing");
}

#[actix_web::test]
async fn status_alias() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_fetch_payment_status().returning(|_| Ok(remote_status("PENDING")));
    let req = TestRequest::get().uri(&format!("/api/payments/status/{CODE}"));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["fromCache"], false);
    assert!(body.get("message").is_none());
}

//----------------------------------------------   Webhook  ----------------------------------------------------
#[actix_web::test]
async fn webhook_with_bad_signature() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let (gw, req) = signed_webhook("PAID", false);
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_signature");
    assert_eq!(stored_status(&db).await, PaymentStatus::Pending);
}

#[actix_web::test]
async fn webhook_cancels_the_order() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let (gw, req) = signed_webhook("CANCELLED", true);
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(stored_status(&db).await, PaymentStatus::Cancelled);
    let outbox = db.fetch_outbox_for_order(&OrderCode::from(CODE)).await.unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].target, NotificationTarget::CancelOrder);
}

#[actix_web::test]
async fn webhook_for_unknown_order() {
    let db = new_db().await;
    let (gw, req) = signed_webhook("PAID", true);
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "transaction_not_found");
}

#[actix_web::test]
async fn webhook_without_status() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_verify_webhook().returning(|_, _| true);
    let req = TestRequest::post()
        .uri("/api/payments/payos/webhook")
        .insert_header(("x-signature", "abc123"))
        .set_json(json!({"code": "00", "data": {"orderCode": CODE}}));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

//----------------------------------------------   Actions  ----------------------------------------------------
#[actix_web::test]
async fn cancel_with_unreachable_gateway() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_cancel_payment()
        .withf(|_, reason| reason.contains("Đổi ý"))
        .returning(|_, _| Err(PaymentGatewayError::Unavailable("timeout".into())));
    let req =
        TestRequest::post().uri(&format!("/api/payments/cancel/{CODE}")).set_json(json!({"cancelReason": "Đổi ý"}));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["orderCode"], CODE);
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(stored_status(&db).await, PaymentStatus::Cancelled);
    let outbox = db.fetch_outbox_for_order(&OrderCode::from(CODE)).await.unwrap();
    assert_eq!(outbox[0].payload["reason"], "Đổi ý");
}

#[actix_web::test]
async fn cancel_without_a_body() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_cancel_payment()
        .withf(|_, reason| reason.contains(checkout_engine::DEFAULT_CANCEL_REASON))
        .returning(|_, _| Ok(GatewayResponse::accepted("success", json!({"code": "00"}))));
    let req = TestRequest::post().uri(&format!("/api/payments/cancel/{CODE}"));
    let (status, _) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored_status(&db).await, PaymentStatus::Cancelled);
}

#[actix_web::test]
async fn confirm_marks_the_payment_as_paid() {
    let db = new_db().await;
    seed_transaction(&db, CODE, None).await;
    let mut gw = gateway();
    gw.expect_confirm_payment().returning(|_| Ok(GatewayResponse::accepted("success", json!({"code": "00"}))));
    let req = TestRequest::post().uri(&format!("/api/payments/confirm/{CODE}"));
    let (status, body) = send(&db, MockGateway::new(), gw, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PAID");
    let tx = db.fetch_transaction(&OrderCode::from(CODE)).await.unwrap().unwrap();
    assert!(tx.payment_date.is_some());
}

#[actix_web::test]
async fn confirm_unknown_order() {
    let db = new_db().await;
    let req = TestRequest::post().uri("/api/payments/confirm/404404");
    let (status, _) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//----------------------------------------------   Read-only views  ----------------------------------------------
#[actix_web::test]
async fn details_show_the_history() {
    let db = new_db().await;
    seed_transaction(&db, CODE, Some(7)).await;
    let req = || TestRequest::get().uri(&format!("/api/payments/details/{CODE}"));
    let (status, first) = send(&db, MockGateway::new(), MockGateway::new(), req()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    let payment = &first["payment"];
    assert_eq!(payment["orderCode"], CODE);
    assert_eq!(payment["status"], "PENDING");
    assert_eq!(payment["amount"], 150000);
    assert_eq!(payment["userId"], 7);
    assert_eq!(payment["customerInfo"]["name"], "Nguyễn Văn A");
    assert_eq!(payment["details"][0]["event"]["type"], "checkoutSnapshot");
    let (_, second) = send(&db, MockGateway::new(), MockGateway::new(), req()).await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn details_for_unknown_order() {
    let db = new_db().await;
    let req = TestRequest::get().uri("/api/payments/details/nope");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn transaction_listings() {
    let db = new_db().await;
    seed_transaction(&db, "1718000000000001", Some(7)).await;
    seed_transaction(&db, "1718000000000002", Some(8)).await;
    seed_transaction(&db, "1718000000000003", Some(7)).await;

    let req = TestRequest::get().uri("/api/payments/transactions");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    let codes =
        body["transactions"].as_array().unwrap().iter().map(|t| t["orderCode"].clone()).collect::<Vec<_>>();
    assert_eq!(codes, vec![json!("1718000000000003"), json!("1718000000000002"), json!("1718000000000001")]);

    let req = TestRequest::get().uri("/api/payments/transactions/user/7");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    let txs = body["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs.iter().all(|t| t["userId"] == 7));

    let req = TestRequest::get().uri("/api/payments/transactions?status=PAID");
    let (_, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert!(body["transactions"].as_array().unwrap().is_empty());

    let req = TestRequest::get().uri("/api/payments/transactions/user/seven");
    let (status, body) = send(&db, MockGateway::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}
