//! Gateway error taxonomy and its HTTP mapping.
//!
//! Only the client message reaches the response body; details are logged.

use crate::input::InputError;
use crate::model_client::ModelError;
use crate::normalize::{NormalizeError, ShapeError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub const MALFORMED_RESPONSE_MESSAGE: &str = "AI analysis returned malformed data. Please try again.";
pub const UNEXPECTED_SHAPE_MESSAGE: &str =
    "AI analysis returned unexpected data structure. Please try again.";
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str =
    "AI analysis service is temporarily unavailable. Please try again later.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred during AI analysis.";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unsupported kind or undecodable payload
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("model reply is not valid JSON: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("model reply has unexpected shape: {0}")]
    UnexpectedShape(ShapeError),

    /// Retryable model failure that persisted through every attempt
    #[error("model unavailable: {0}")]
    UpstreamUnavailable(ModelError),

    #[error("model call failed: {0}")]
    Upstream(ModelError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<NormalizeError> for GatewayError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::Malformed { source, raw } => {
                GatewayError::MalformedResponse { source, raw }
            }
            NormalizeError::Shape(shape) => GatewayError::UnexpectedShape(shape),
        }
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::MalformedResponse { .. }
            | GatewayError::UnexpectedShape(_)
            | GatewayError::Upstream(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::InvalidInput(e) => e.to_string(),
            GatewayError::MalformedResponse { .. } => MALFORMED_RESPONSE_MESSAGE.to_string(),
            GatewayError::UnexpectedShape(_) => UNEXPECTED_SHAPE_MESSAGE.to_string(),
            GatewayError::UpstreamUnavailable(_) => UPSTREAM_UNAVAILABLE_MESSAGE.to_string(),
            GatewayError::Upstream(_) | GatewayError::Internal(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }

    fn log(&self) {
        match self {
            GatewayError::InvalidInput(e) => warn!("Rejected verification input: {}", e),
            GatewayError::MalformedResponse { source, raw } => {
                error!("Gateway - model response was not valid JSON: {}\nResponse: {}", source, raw)
            }
            GatewayError::UnexpectedShape(e) => {
                error!("Gateway - invalid model response structure: {}", e)
            }
            GatewayError::UpstreamUnavailable(e) => {
                error!("Gateway - model unavailable after retries: {}", e)
            }
            GatewayError::Upstream(e) => error!("Gateway - model call failed: {}", e),
            GatewayError::Internal(e) => error!("Gateway - unexpected error: {}", e),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({ "detail": self.client_message() }));
        (self.status_code(), body).into_response()
    }
}
