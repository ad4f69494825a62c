//! Application error taxonomy and its HTTP mapping.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

use crate::mailer::MailError;
use crate::media::{MediaError, MAX_FILE_SIZE};
use crate::newsletter::NewsletterError;
use crate::store::StoreError;

/// Field name -> human readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("File too large. Maximum size is {max_mb}MB.")]
    PayloadTooLarge { max_mb: usize },

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stored file is empty or corrupt")]
    CorruptUpload,

    #[error("Deletion failed: {0}")]
    DeletionFailed(String),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("{0} is not configured")]
    Unavailable(&'static str),
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::PayloadTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_)
            | AppError::Storage(_)
            | AppError::CorruptUpload
            | AppError::DeletionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Mail(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(details)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record"),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::PermissionDenied(msg) => AppError::Store(msg),
            StoreError::Backend(msg) => AppError::Store(msg),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::TooLarge => AppError::PayloadTooLarge {
                max_mb: MAX_FILE_SIZE / (1024 * 1024),
            },
            MediaError::InvalidPath
            | MediaError::UnknownCategory(_)
            | MediaError::UnsupportedType
            | MediaError::EmptyUpload => AppError::BadRequest(err.to_string()),
            MediaError::Missing => AppError::NotFound("File"),
            MediaError::Empty => AppError::CorruptUpload,
            MediaError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::Mail(err.to_string())
    }
}

impl From<NewsletterError> for AppError {
    fn from(err: NewsletterError) -> Self {
        match err {
            NewsletterError::NotConfigured => AppError::Unavailable("Newsletter"),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("invalid {field} ({})", e.code))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        AppError::Validation(details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        let details = match &self {
            AppError::Validation(details) => Some(details.clone()),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                details,
            }),
        )
            .into_response()
    }
}
