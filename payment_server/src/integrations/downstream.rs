use std::{sync::Arc, time::Duration};

use bks_common::helpers::{env_number, env_string_or};
use checkout_engine::{
    db_types::NotificationTarget,
    traits::{Notifier, NotifyError},
};
use log::*;
use reqwest::Client;
use serde_json::Value;

pub const DEFAULT_ORDER_SERVICE_URL: &str = "http://localhost:8005";
pub const DEFAULT_CART_SERVICE_URL: &str = "http://localhost:8006";
pub const DEFAULT_DOWNSTREAM_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    /// Base URL of the order service, without a trailing slash
    pub order_service_url: String,
    /// Base URL of the cart service, without a trailing slash
    pub cart_service_url: String,
    pub timeout: Duration,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            order_service_url: DEFAULT_ORDER_SERVICE_URL.to_string(),
            cart_service_url: DEFAULT_CART_SERVICE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_DOWNSTREAM_TIMEOUT_MS),
        }
    }
}

impl DownstreamConfig {
    pub fn from_env_or_default() -> Self {
        let order_service_url =
            env_string_or("ORDER_SERVICE_URL", DEFAULT_ORDER_SERVICE_URL).trim_end_matches('/').to_string();
        let cart_service_url =
            env_string_or("CART_SERVICE_URL", DEFAULT_CART_SERVICE_URL).trim_end_matches('/').to_string();
        let timeout = Duration::from_millis(env_number("BPS_DOWNSTREAM_TIMEOUT_MS", DEFAULT_DOWNSTREAM_TIMEOUT_MS));
        Self { order_service_url, cart_service_url, timeout }
    }

    /// The full URL that notifications for `target` are posted to.
    pub fn endpoint(&self, target: NotificationTarget) -> String {
        match target {
            NotificationTarget::CreateOrder => format!("{}/api/orders", self.order_service_url),
            NotificationTarget::PaymentCompleted => format!("{}/api/orders/payment-completed", self.order_service_url),
            NotificationTarget::PaymentFailed => format!("{}/api/orders/payment-failed", self.order_service_url),
            NotificationTarget::CancelOrder => format!("{}/api/orders/cancel-order", self.order_service_url),
            NotificationTarget::CartCheckout => format!("{}/api/cart/checkout", self.cart_service_url),
        }
    }
}

/// Posts outbox notifications to the order and cart services.
#[derive(Clone)]
pub struct DownstreamClient {
    config: DownstreamConfig,
    client: Arc<Client>,
}

impl DownstreamClient {
    pub fn new(config: DownstreamConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &DownstreamConfig {
        &self.config
    }
}

impl Notifier for DownstreamClient {
    async fn deliver(&self, target: NotificationTarget, payload: &Value) -> Result<(), NotifyError> {
        let url = self.config.endpoint(target);
        trace!("📮️ POST {url}");
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable { target, reason: e.to_string() })?;
        let status = response.status();
        if status.is_success() {
            debug!("📮️ {target} accepted the notification ({status})");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected { target, status: status.as_u16(), body })
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    fn config_for(server: &MockServer) -> DownstreamConfig {
        DownstreamConfig {
            order_service_url: server.uri(),
            cart_service_url: format!("{}/cart-svc", server.uri()),
            timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn endpoints() {
        let config = DownstreamConfig::default();
        assert_eq!(config.endpoint(NotificationTarget::CreateOrder), "http://localhost:8005/api/orders");
        assert_eq!(
            config.endpoint(NotificationTarget::PaymentCompleted),
            "http://localhost:8005/api/orders/payment-completed"
        );
        assert_eq!(
            config.endpoint(NotificationTarget::PaymentFailed),
            "http://localhost:8005/api/orders/payment-failed"
        );
        assert_eq!(config.endpoint(NotificationTarget::CancelOrder), "http://localhost:8005/api/orders/cancel-order");
        assert_eq!(config.endpoint(NotificationTarget::CartCheckout), "http://localhost:8006/api/cart/checkout");
    }

    #[tokio::test]
    async fn delivers_to_the_order_service() {
        let server = MockServer::start().await;
        let payload = json!({ "orderCode": "1718000000001" });
        Mock::given(method("POST"))
            .and(path("/api/orders/payment-completed"))
            .and(body_json(payload.clone()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let client = DownstreamClient::new(config_for(&server)).unwrap();
        client.deliver(NotificationTarget::PaymentCompleted, &payload).await.unwrap();
    }

    #[tokio::test]
    async fn cart_notifications_use_the_cart_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cart-svc/api/cart/checkout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let client = DownstreamClient::new(config_for(&server)).unwrap();
        let payload = json!({ "userId": 7, "productIds": [11, 12] });
        client.deliver(NotificationTarget::CartCheckout, &payload).await.unwrap();
    }

    #[tokio::test]
    async fn error_statuses_are_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/cancel-order"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        let client = DownstreamClient::new(config_for(&server)).unwrap();
        let err = client
            .deliver(NotificationTarget::CancelOrder, &json!({ "orderCode": "1", "reason": "x" }))
            .await
            .expect_err("503 must not count as delivered");
        match err {
            NotifyError::Rejected { target, status, body } => {
                assert_eq!(target, NotificationTarget::CancelOrder);
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            },
            e => panic!("Unexpected error {e}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service() {
        let config = DownstreamConfig {
            order_service_url: "http://127.0.0.1:1".into(),
            cart_service_url: "http://127.0.0.1:1".into(),
            timeout: Duration::from_millis(200),
        };
        let client = DownstreamClient::new(config).unwrap();
        let err = client.deliver(NotificationTarget::PaymentFailed, &json!({})).await.unwrap_err();
        assert!(matches!(err, NotifyError::Unreachable { target: NotificationTarget::PaymentFailed, .. }));
    }
}
