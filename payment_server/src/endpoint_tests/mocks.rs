use checkout_engine::{
    db_types::OrderCode,
    traits::{GatewayResponse, PaymentGateway, PaymentGatewayError, PaymentLinkRequest},
};
use mockall::mock;
use serde_json::Value;

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
