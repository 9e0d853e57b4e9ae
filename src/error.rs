//! Error types surfaced by the HTTP layer.

use std::collections::BTreeMap;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

/// Per-field validation messages, keyed by payload field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The referenced recipe does not exist.
    #[error("recipe not found")]
    NotFound,

    /// The payload failed a field-level check or a storage constraint.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// The request body could not be deserialized.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Storage error other than the ones mapped above.
    #[error("database error: {0}")]
    Database(DieselError),

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// The blocking task running the storage call was canceled.
    #[error("blocking task canceled")]
    Canceled,
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field, message.into());
        AppError::Validation(fields)
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            // recipes.name carries the only unique constraint reachable
            // from user input
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::validation("name", "a recipe with this name already exists")
            }
            other => AppError::Database(other),
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(_: BlockingError) -> Self {
        AppError::Canceled
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Pool(_) | AppError::Canceled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NotFound => json!({
                "error": "not_found",
                "message": self.to_string(),
            }),
            AppError::Validation(fields) => json!({
                "error": "validation_failure",
                "fields": fields,
            }),
            AppError::Malformed(detail) => json!({
                "error": "malformed_payload",
                "message": detail,
            }),
            other => {
                log::error!("request failed: {other}");
                json!({
                    "error": "internal",
                    "message": other.to_string(),
                })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
