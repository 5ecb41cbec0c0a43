//! Crate-wide error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("invoice rendering failed: {0}")]
    Pdf(String),

    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        match first_field_error(&errors) {
            Some((field, message)) => Self::validation(field, message),
            None => Self::validation("request", "invalid request"),
        }
    }
}

/// Walks nested validation errors and surfaces the first offending leaf
/// field.
fn first_field_error(errors: &validator::ValidationErrors) -> Option<(String, String)> {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .clone()
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| err.code.to_string());
                    return Some((field.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_field_error(inner) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    if let Some(found) = first_field_error(inner) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::InsufficientStock { .. } => (StatusCode::CONFLICT, self.to_string()),
            Self::Config(_) | Self::Database(_) | Self::Pdf(_) | Self::Io(_) => {
                // Original cause is logged only; callers get a generic body.
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "full name is required"))]
        full_name: String,
    }

    #[test]
    fn validator_errors_surface_the_offending_field() {
        let err: AppError = Probe {
            full_name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "full_name");
                assert_eq!(message, "full name is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
