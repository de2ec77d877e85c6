//! Error types for the tweetlens service.
//!
//! Every failure that can reach an HTTP caller is an [`ApiError`]. Handlers
//! return it directly and axum renders it through [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// A search was attempted before any credentials were configured.
    #[error("Twitter credentials are not configured; call /account_manage first")]
    ConfigurationMissing,

    /// The credential bundle sent to `/account_manage` was unusable.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The upstream API refused access to the requested resource.
    #[error("Twitter API denied access: {0}")]
    UpstreamForbidden(String),

    /// Any other upstream failure: network, status code, payload, missing user.
    #[error("Twitter API error: {0}")]
    UpstreamError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ConfigurationMissing => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UpstreamForbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UpstreamError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short human-readable summary used as the `message` field.
    fn summary(&self) -> &'static str {
        match self {
            ApiError::ConfigurationMissing => "Credentials not configured",
            ApiError::InvalidCredentials(_) => "Invalid credentials",
            ApiError::UpstreamForbidden(_) => "Access forbidden by Twitter API",
            ApiError::UpstreamError(_) => "Twitter API request failed",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::UpstreamError(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::UpstreamError(format!("malformed response: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(json!({
                "status": "error",
                "message": self.summary(),
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
