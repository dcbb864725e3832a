//! The one error type every handler returns, and its JSON rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use lorry_desk_core::models::{ArticleError, BookingError, OgplError};

use crate::db::RepositoryError;
use crate::import_export::ImportError;

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A field is missing or invalid. Nothing was changed.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The record's current state forbids the operation.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// No record with that id in this organization.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The data-access collaborator rejected the call.
    #[error("External service error: {0}")]
    ExternalService(RepositoryError),

    /// A CSV upload had unusable rows. Nothing was imported.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Malformed query or body that never reached the domain rules.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A bug on our side.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Machine-readable kind used in response bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::Import(_) => "validation_error",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::NotFound(_) => "not_found",
            Self::ExternalService(_) => "external_service_failure",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PreconditionFailed(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_string()),
            RepositoryError::Conflict(message) => Self::PreconditionFailed(message),
            other => Self::ExternalService(other),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation { field, message } => Self::validation(field, message),
            precondition @ BookingError::PreconditionFailed { .. } => {
                Self::PreconditionFailed(precondition.to_string())
            }
        }
    }
}

impl From<OgplError> for AppError {
    fn from(err: OgplError) -> Self {
        match err {
            OgplError::Validation { field, message } => Self::validation(field, message),
            other if other.is_precondition() => Self::PreconditionFailed(other.to_string()),
            other => Self::validation("entries", other.to_string()),
        }
    }
}

impl From<ArticleError> for AppError {
    fn from(err: ArticleError) -> Self {
        Self::validation(err.field(), err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Only 5xx responses reach Sentry.
        if matches!(self, Self::ExternalService(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request failed"
            );
        }

        let status = self.status();

        // Internal detail stays in the log.
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::ExternalService(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        let mut body = json!({ "error": self.code(), "message": message });
        match &self {
            Self::Validation { field, .. } => body["field"] = json!(field),
            Self::Import(ImportError::Rows(rows)) => body["rows"] = json!(rows),
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
