use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayosApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not sign payload: {0}")]
    Signing(String),
    #[error("Order code cannot be sent to the gateway: {0}")]
    InvalidOrderCode(String),
}

impl PayosApiError {
    /// True if the gateway could not be reached or answered with a server error, i.e. a retry might succeed.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            Self::RestRequestError(_) | Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
