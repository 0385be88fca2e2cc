use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burnbin_gateway::GatewayError;
use thiserror::Error;

/// Errors that can occur when running the burnbin server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A gateway-level error surfaced through the API.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A backend could not be reached at startup.
    #[error("backend error: {0}")]
    Backend(String),

    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The upload exceeded `server.max_body_bytes`.
    #[error("payload too large")]
    PayloadTooLarge,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            Self::Gateway(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, "paste not found".to_owned())
            }
            Self::Gateway(GatewayError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Gateway(e) => {
                tracing::error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            Self::Config(msg) | Self::Backend(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
