//! [`PaymentGateway`] backed by the PayOS merchant API.
//!
//! The engine only needs to know whether the gateway answered, and what it said. So:
//! * a reply with the gateway's own envelope, successful or not, is `Ok`;
//! * a 4xx without an envelope is turned into a rejected `Ok` as well, since a retry would not help;
//! * everything else (timeouts, connection failures, 5xx) is [`PaymentGatewayError::Unavailable`].
use checkout_engine::{
    db_types::{LineItem, OrderCode},
    traits::{GatewayResponse, PaymentGateway, PaymentGatewayError, PaymentLinkRequest},
};
use log::*;
use payos_tools::{
    helpers::numeric_order_code,
    BuyerInfo,
    PaymentItem,
    PaymentOrder,
    PayosApi,
    PayosApiError,
    PayosResponse,
};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct PayosGateway {
    api: PayosApi,
}

impl PayosGateway {
    pub fn new(api: PayosApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &PayosApi {
        &self.api
    }

    fn order_from(request: PaymentLinkRequest) -> PaymentOrder {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        PaymentOrder {
            order_code: request.order_code.to_string(),
            amount: request.amount,
            description: request.description,
            buyer: BuyerInfo {
                name: non_empty(request.customer.full_name),
                email: non_empty(request.customer.email),
                phone: non_empty(request.customer.phone),
            },
            items: request.items.iter().map(payment_item).collect(),
            return_url: None,
            cancel_url: None,
        }
    }
}

fn payment_item(item: &LineItem) -> PaymentItem {
    PaymentItem { name: item.display_name(), quantity: item.quantity, price: item.price }
}

fn gateway_response(resp: PayosResponse) -> GatewayResponse {
    let raw = resp.to_value();
    let mut result = if resp.is_success() {
        GatewayResponse::accepted(resp.desc.clone(), raw)
    } else {
        GatewayResponse::rejected(resp.desc.clone(), raw)
    };
    if let Some(url) = resp.checkout_url() {
        result = result.with_checkout_url(url);
    }
    if let Some(status) = resp.status() {
        result = result.with_remote_status(status);
    }
    result
}

fn convert(result: Result<PayosResponse, PayosApiError>) -> Result<GatewayResponse, PaymentGatewayError> {
    match result {
        Ok(resp) => Ok(gateway_response(resp)),
        Err(e) if e.is_transport_failure() => Err(PaymentGatewayError::Unavailable(e.to_string())),
        Err(PayosApiError::QueryError { status, message }) => {
            debug!("🏦️ Gateway returned {status} without an error envelope. {message}");
            let raw = json!({ "status": status, "body": message });
            Ok(GatewayResponse::rejected(format!("The gateway returned status {status}"), raw))
        },
        Err(e @ (PayosApiError::InvalidOrderCode(_) | PayosApiError::Signing(_))) => {
            Err(PaymentGatewayError::InvalidRequest(e.to_string()))
        },
        Err(e) => Err(PaymentGatewayError::Unavailable(e.to_string())),
    }
}

impl PaymentGateway for PayosGateway {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<GatewayResponse, PaymentGatewayError> {
        let order = Self::order_from(request);
        convert(self.api.create_payment_request(&order).await)
    }

    async fn fetch_payment_status(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError> {
        convert(self.api.get_payment_status(code.as_str()).await)
    }

    async fn confirm_payment(&self, code: &OrderCode) -> Result<GatewayResponse, PaymentGatewayError> {
        convert(self.api.confirm_payment(code.as_str()).await)
    }

    async fn cancel_payment(&self, code: &OrderCode, reason: &str) -> Result<GatewayResponse, PaymentGatewayError> {
        convert(self.api.cancel_payment(code.as_str(), reason).await)
    }

    fn verify_webhook(&self, payload: &Value, signature: &str) -> bool {
        self.api.verify_webhook(payload, signature)
    }

    fn gateway_code(&self, code: &OrderCode) -> Option<i64> {
        numeric_order_code(code.as_str()).ok()
    }
}
