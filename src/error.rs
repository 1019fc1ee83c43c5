//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::repository::StoreError;

/// Field name (camelCase, as sent by clients) to the messages raised for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Validation Errors**: malformed or missing input, reported before any side effect
/// - **Authentication Errors**: missing, invalid or expired sessions; bad credentials
/// - **Resource Errors**: unknown submission ids and missing files
/// - **Setup Errors**: bootstrap attempted twice, or login before bootstrap
/// - **Storage / Persistence Errors**: disk and datastore failures, never shown to clients
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more fields broke a validation rule.
    ///
    /// `message` is the first human-readable problem; `fields` carries all of them.
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    /// Request body, multipart stream or query string could not be parsed.
    #[error("{0}")]
    InvalidRequest(String),

    /// No session cookie, or the token failed verification.
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No admin account exists yet; the bootstrap flow must run first.
    #[error("Admin setup required")]
    SetupRequired,

    /// Setup attempted while an admin account already exists.
    #[error("Admin account already exists")]
    AdminExists,

    /// The named resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A file path resolved outside the upload root.
    #[error("Invalid path")]
    InvalidPath,

    #[error("Uploaded file is too large")]
    PayloadTooLarge,

    /// Disk read or write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Datastore operation failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Hashing, signing or task-join failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A validation failure that is not tied to a single field.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    /// Build a validation error from collected field errors.
    ///
    /// The headline message is the first message of the first field in name order.
    pub fn from_fields(fields: FieldErrors) -> Self {
        let message = fields
            .values()
            .find_map(|messages| messages.first().cloned())
            .unwrap_or_else(|| "Validation failed".to_string());
        AppError::Validation { message, fields }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::SetupRequired => (StatusCode::FORBIDDEN, "setup_required"),
            AppError::AdminExists => (StatusCode::BAD_REQUEST, "admin_exists"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidPath => (StatusCode::BAD_REQUEST, "invalid_path"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Storage(_) | AppError::Persistence(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "error": "Human-readable error message",
///   "code": "error_type",
///   "fields": { "email": ["Please enter a valid email address"] }
/// }
/// ```
///
/// `fields` is only present for validation failures. Server-side failures
/// (`Storage`, `Persistence`, `Internal`) are logged and answered with a
/// generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = match self {
            AppError::Validation { fields, .. } if !fields.is_empty() => json!({
                "success": false,
                "error": message,
                "code": code,
                "fields": fields,
            }),
            _ => json!({
                "success": false,
                "error": message,
                "code": code,
            }),
        };

        (status, Json(body)).into_response()
    }
}
