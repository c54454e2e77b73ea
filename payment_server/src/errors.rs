use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{ErrorKind, PaymentFlowError};
use log::error;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request parameters: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    PaymentFlow(#[from] PaymentFlowError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The machine-readable error category sent to clients in the `kind` field.
    pub fn kind(&self) -> String {
        match self {
            Self::PaymentFlow(e) => e.kind().to_string(),
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => ErrorKind::Validation.to_string(),
            _ => "internal".to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::PaymentFlow(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::GatewayRejected => StatusCode::BAD_REQUEST,
                ErrorKind::InvalidSignature => StatusCode::BAD_REQUEST,
                ErrorKind::TransactionNotFound => StatusCode::NOT_FOUND,
                ErrorKind::DuplicateOrderCode => StatusCode::CONFLICT,
                ErrorKind::ConcurrentModification => StatusCode::CONFLICT,
                ErrorKind::MissingCheckoutUrl => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::GatewayUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ Request failed with {status}. {self}");
        }
        // Gateway failures carry the gateway's reply so that the storefront can show its message
        let detail = match self {
            Self::PaymentFlow(e) => e.gateway_response().cloned(),
            _ => None,
        }
        .unwrap_or_else(|| Value::String(self.to_string()));
        HttpResponse::build(status).insert_header(ContentType::json()).body(
            json!({
                "success": false,
                "message": self.to_string(),
                "kind": self.kind(),
                "error": detail,
            })
            .to_string(),
        )
    }
}
