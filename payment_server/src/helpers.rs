use actix_web::{error, web, HttpRequest};
use log::*;

use crate::errors::ServerError;

/// The token from an `Authorization: Bearer ...` header, if there is one.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Malformed JSON bodies are reported in the same shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request body. {err}");
        error::Error::from(ServerError::InvalidRequestBody(err.to_string()))
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting query string. {err}");
        error::Error::from(ServerError::InvalidRequestPath(err.to_string()))
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request path. {err}");
        error::Error::from(ServerError::InvalidRequestPath(err.to_string()))
    })
}
