//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ResultsError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Pipeline error
    Results(ResultsError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Results(e) => match e {
                ResultsError::NoDataset => StatusCode::NOT_FOUND,
                ResultsError::Decode { .. }
                | ResultsError::SchemaInsufficient { .. }
                | ResultsError::Delimited { .. }
                | ResultsError::Spreadsheet { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ResultsError::Config(_) | ResultsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg),
            AppError::Results(e) => {
                let error = ApiError::new(e.code(), e.to_string());
                match e.context() {
                    Some(ctx) => error.with_details(ctx.to_string()),
                    None => error,
                }
            }
        };

        if status.is_server_error() {
            tracing::error!(code = %error.code, "{}", error.message);
        }

        (status, Json(error)).into_response()
    }
}

impl From<ResultsError> for AppError {
    fn from(err: ResultsError) -> Self {
        AppError::Results(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorContext;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(ResultsError::NoDataset).status(),
            StatusCode::NOT_FOUND
        );
        let schema = ResultsError::SchemaInsufficient {
            found: 5,
            required: 8,
            context: ErrorContext::new("normalize"),
        };
        assert_eq!(
            AppError::from(schema).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_response_carries_status() {
        let response = AppError::from(ResultsError::NoDataset).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
