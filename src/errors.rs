use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    // Database errors (1xxx)
    DatabaseConnection = 1001,
    DatabaseQuery = 1002,

    // Validation errors (2xxx)
    MissingField = 2004,

    // External service errors (5xxx)
    SourceError = 5003,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    // Database errors
    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] sea_orm::DbErr),

    // Validation errors
    #[error("{0} is required")]
    MissingField(String),

    // External service errors (NASA images, TechPort, Wikipedia)
    #[error("External source error: {0}")]
    SourceError(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DatabaseConnectionError(_) => ErrorCode::DatabaseConnection,
            Self::DatabaseQueryError(_) => ErrorCode::DatabaseQuery,
            Self::MissingField(_) => ErrorCode::MissingField,
            Self::SourceError(_) => ErrorCode::SourceError,
            Self::InternalError(_) => ErrorCode::InternalError,
            Self::ConfigError(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseQueryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::SourceError(_) => StatusCode::BAD_GATEWAY,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::MissingField(_) => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
                "details": if cfg!(debug_assertions) {
                    Some(format!("{:?}", self))
                } else {
                    None
                }
            }
        }));

        (status, body).into_response()
    }
}
