use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::envelope::TranslationResult;

pub const METHOD_NOT_ALLOWED_BODY: &str = "Only POST requests are allowed";

/// Every way a gateway request can end without a translation
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{}", METHOD_NOT_ALLOWED_BODY)]
    MethodNotAllowed,

    #[error("unauthorized")]
    Unauthorized,

    #[error("failed to read request body: {0}")]
    BodyRead(axum::Error),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be at least 2 characters, got '{value}'")]
    LanguageTooShort { field: &'static str, value: String },

    /// The model answered, but with an error instead of a translation
    #[error("{0}")]
    Translation(String),

    #[error("{0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl GatewayError {
    /// The envelope for this error, or `None` for the plain-text 405 path
    pub fn envelope(&self) -> Option<TranslationResult> {
        match self {
            GatewayError::MethodNotAllowed => None,
            GatewayError::Unauthorized => Some(TranslationResult::unauthorized()),
            GatewayError::Translation(raw) => Some(TranslationResult::translation_error(raw.clone())),
            GatewayError::BodyRead(_)
            | GatewayError::InvalidBody(_)
            | GatewayError::MissingField(_)
            | GatewayError::LanguageTooShort { .. }
            | GatewayError::Upstream(_) => Some(TranslationResult::internal_error(self.to_string())),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self.envelope() {
            Some(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
            None => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                METHOD_NOT_ALLOWED_BODY,
            )
                .into_response(),
        }
    }
}
