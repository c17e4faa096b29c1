// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("YouTube API error: {0}")]
    YouTubeApi(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker for YouTube responses rejected because the credential is no good.
    pub const YOUTUBE_TOKEN_ERROR: &'static str = "YouTube rejected the access token";

    /// Returns true if this error came from a rejected YouTube credential.
    pub fn is_youtube_token_error(&self) -> bool {
        matches!(self, AppError::YouTubeApi(msg) if msg.starts_with(Self::YOUTUBE_TOKEN_ERROR))
    }

    /// Short machine-readable code used in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "configuration_error",
            AppError::Authorization(_) => "authorization_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::YouTubeApi(_) => "youtube_error",
            AppError::Spreadsheet(_) => "spreadsheet_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Authorization(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::YouTubeApi(msg) if self.is_youtube_token_error() => {
                tracing::warn!(error = %msg, "YouTube rejected the credential");
                (
                    StatusCode::UNAUTHORIZED,
                    Some(format!("{}; start again from /login", msg)),
                )
            }
            AppError::YouTubeApi(msg) => {
                tracing::warn!(error = %msg, "YouTube API error");
                (StatusCode::BAD_GATEWAY, Some(msg.clone()))
            }
            AppError::Spreadsheet(msg) => {
                tracing::error!(error = %msg, "Spreadsheet error");
                (StatusCode::BAD_GATEWAY, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
