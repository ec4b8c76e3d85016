use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by a storage node for a single query.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no storage nodes configured")]
    NoNodes,

    #[error("storage node {addr} unreachable: {reason}")]
    Unavailable { addr: String, reason: String },

    #[error("no such series: {endpoint}/{counter}")]
    NoSuchSeries { endpoint: String, counter: String },

    #[error("storage node {addr} timed out")]
    Timeout { addr: String },

    #[error("storage node {addr} returned HTTP {status}")]
    Status { addr: String, status: u16 },

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("empty_payload")]
    EmptyRequest,

    #[error("empty_endpoint_counter")]
    MissingIdentity,

    #[error("invalid_cf")]
    InvalidConsolidation,

    #[error("invalid_duration")]
    InvalidWindow,

    #[error("{0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::InvalidPayload(err.to_string())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidPayload(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::InvalidPayload(rejection.body_text())
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::EmptyRequest
            | GatewayError::MissingIdentity
            | GatewayError::InvalidConsolidation
            | GatewayError::InvalidWindow
            | GatewayError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            GatewayError::Backend(BackendError::NoSuchSeries { .. }) => StatusCode::NOT_FOUND,
            GatewayError::Backend(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Config(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "msg": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
