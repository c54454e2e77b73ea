use std::sync::Arc;

use bks_common::helpers::default_description;
use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::PayosConfig,
    data_objects::{CancelPaymentRequest, ConfirmPaymentRequest, PaymentOrder, PaymentRequest, PayosResponse},
    helpers::{numeric_order_code, payment_link_expiry},
    signature,
    PayosApiError,
};

#[derive(Clone)]
pub struct PayosApi {
    config: PayosConfig,
    client: Arc<Client>,
}

impl PayosApi {
    pub fn new(config: PayosConfig) -> Result<Self, PayosApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let client_id = HeaderValue::from_str(config.client_id.as_str())
            .map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        let mut api_key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        api_key.set_sensitive(true);
        headers.insert("x-client-id", client_id);
        headers.insert("x-api-key", api_key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PayosConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Sends a request to the gateway. Any non-2xx status is returned as [`PayosApiError::QueryError`] carrying the
    /// raw response body, so that callers can decide whether the body is a usable gateway error envelope.
    pub async fn rest_query<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        checksum: Option<String>,
    ) -> Result<PayosResponse, PayosApiError> {
        let url = self.url(path);
        trace!("🏦️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(checksum) = checksum {
            req = req.header("x-checksum", checksum);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| PayosApiError::RestRequestError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("🏦️ REST query successful. {status}");
            response.json::<PayosResponse>().await.map_err(|e| PayosApiError::JsonError(e.to_string()))
        } else {
            let message = response.text().await.map_err(|e| PayosApiError::RestResponseError(e.to_string()))?;
            Err(PayosApiError::QueryError { status: status.as_u16(), message })
        }
    }

    /// Builds the wire request for `order`. Exposed so that callers can inspect exactly what will be signed and sent.
    pub fn build_payment_request(&self, order: &PaymentOrder) -> Result<PaymentRequest, PayosApiError> {
        let order_code = numeric_order_code(&order.order_code)?;
        let description = order
            .description
            .as_ref()
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| default_description(&order.order_code));
        let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();
        Ok(PaymentRequest {
            order_code,
            amount: order.amount,
            description,
            cancel_url: order.cancel_url.clone().unwrap_or_else(|| self.config.return_url.clone()),
            return_url: order.return_url.clone().unwrap_or_else(|| self.config.return_url.clone()),
            buyer_name: non_empty(&order.buyer.name),
            buyer_email: non_empty(&order.buyer.email),
            buyer_phone: non_empty(&order.buyer.phone),
            expired_at: payment_link_expiry(Utc::now()),
            webhook_url: self.config.webhook_url.clone(),
            items: order.items.clone(),
        })
    }

    /// Opens a payment link for the order.
    ///
    /// Application errors reported by the gateway (including those sent with a 4xx/5xx status and a JSON error
    /// envelope) are returned as `Ok` with a non-success `code`. Only failures to reach the gateway, or error
    /// responses without a usable body, are returned as `Err`.
    pub async fn create_payment_request(&self, order: &PaymentOrder) -> Result<PayosResponse, PayosApiError> {
        let request = self.build_payment_request(order)?;
        let checksum = signature::sign(&request.signing_payload()?, self.config.checksum_key.reveal())?;
        debug!("🏦️ Creating payment request for order {} ({})", order.order_code, request.order_code);
        match self.rest_query(Method::POST, "/v2/payment-requests", Some(&request), Some(checksum)).await {
            Ok(resp) => {
                info!("🏦️ Payment request for order {} returned code {}", order.order_code, resp.code);
                Ok(resp)
            },
            Err(PayosApiError::QueryError { status, message }) => {
                match serde_json::from_str::<PayosResponse>(&message) {
                    Ok(resp) if !resp.code.is_empty() => {
                        warn!("🏦️ Gateway rejected payment request for {} ({status}): {}", order.order_code, resp.desc);
                        Ok(resp)
                    },
                    _ => Err(PayosApiError::QueryError { status, message }),
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Fetches the current state of a payment link. The order code may be in local or numeric form.
    pub async fn get_payment_status(&self, order_code: &str) -> Result<PayosResponse, PayosApiError> {
        let code = numeric_order_code(order_code)?;
        let path = format!("/v2/payment-requests/{code}");
        debug!("🏦️ Fetching payment status for order {order_code}");
        self.rest_query::<()>(Method::GET, &path, None, None).await
    }

    pub async fn confirm_payment(&self, order_code: &str) -> Result<PayosResponse, PayosApiError> {
        let body = ConfirmPaymentRequest { order_code: numeric_order_code(order_code)? };
        let checksum = signature::sign_serializable(&body, self.config.checksum_key.reveal())?;
        debug!("🏦️ Confirming payment for order {order_code}");
        self.rest_query(Method::POST, "/v2/confirm-payment", Some(&body), Some(checksum)).await
    }

    pub async fn cancel_payment(&self, order_code: &str, reason: &str) -> Result<PayosResponse, PayosApiError> {
        let body =
            CancelPaymentRequest { order_code: numeric_order_code(order_code)?, cancel_reason: reason.to_string() };
        let checksum = signature::sign_serializable(&body, self.config.checksum_key.reveal())?;
        debug!("🏦️ Cancelling payment for order {order_code}. Reason: {reason}");
        self.rest_query(Method::POST, "/v2/cancel-payment-request", Some(&body), Some(checksum)).await
    }

    /// Checks the `x-signature` header of a webhook against the complete request body.
    pub fn verify_webhook(&self, body: &Value, signature_header: &str) -> bool {
        let valid = signature::verify(body, signature_header, self.config.checksum_key.reveal());
        if !valid {
            warn!("🔐️ Webhook signature does not match the payload");
        }
        valid
    }
}
