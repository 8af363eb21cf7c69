use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::pages;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    LengthRequired,
    PayloadTooLarge(usize),
    BadGateway(String),
    GatewayTimeout,
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::LengthRequired => write!(f, "Length Required"),
            AppError::PayloadTooLarge(limit) => {
                write!(f, "Payload Too Large: body exceeds {limit} bytes")
            }
            AppError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            AppError::GatewayTimeout => write!(f, "Gateway Timeout: store did not reply"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::LengthRequired => (
                StatusCode::LENGTH_REQUIRED,
                "The form was sent without a Content-Length header.".to_string(),
            ),
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("The message is larger than {limit} bytes."),
            ),
            AppError::BadGateway(msg) => {
                tracing::warn!("Bad gateway: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The message store gave an unexpected answer.".to_string(),
                )
            }
            AppError::GatewayTimeout => {
                tracing::warn!("Store did not reply in time");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The message store did not answer in time.".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        pages::error_page(status, message).into_response()
    }
}

/// Failure while reading or rewriting the message log.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "log file I/O failed: {err}"),
            StoreError::Serialize(err) => write!(f, "log serialization failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialize(err)
    }
}
