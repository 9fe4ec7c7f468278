use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::core::MatchError;
use crate::models::{ErrorResponse, FieldError};
use crate::services::{AuthError, StoreError};

/// Error type returned by every HTTP handler.
///
/// Client errors carry their message to the response body. Server errors
/// are logged and answered with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }
}

impl error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Conflict(_) | StoreError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Match(MatchError::UserNotFound(_) | MatchError::InternshipNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Auth(AuthError::InvalidToken(_)) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let body = match self {
            AppError::Validation(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(field_errors(errors)),
            },
            AppError::Store(StoreError::NotFound(what)) => ErrorResponse {
                error: format!("{} not found", what),
                details: None,
            },
            AppError::Store(StoreError::Conflict(message) | StoreError::InvalidInput(message)) => ErrorResponse {
                error: message.clone(),
                details: None,
            },
            AppError::Match(MatchError::UserNotFound(_)) => ErrorResponse {
                error: "User not found".to_string(),
                details: None,
            },
            AppError::Match(MatchError::InternshipNotFound(_)) => ErrorResponse {
                error: "Internship not found".to_string(),
                details: None,
            },
            AppError::Auth(AuthError::InvalidToken(_)) => ErrorResponse {
                error: "Invalid or expired token".to_string(),
                details: None,
            },
            _ if status.is_server_error() => {
                tracing::error!("Request failed: {}", self);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        HttpResponse::build(status).json(body)
    }
}

/// Flatten validator output into `{field, message}` pairs, sorted by field
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .errors()
        .iter()
        .flat_map(|(field, kind)| match kind {
            ValidationErrorsKind::Field(list) => list
                .iter()
                .map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
                .collect::<Vec<_>>(),
            _ => vec![FieldError {
                field: field.to_string(),
                message: format!("Invalid value for {}", field),
            }],
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Malformed JSON bodies answer 400 with the same error shape as handlers
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    AppError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query string error on {}: {}", req.path(), err);
    AppError::BadRequest(format!("Invalid query: {}", err)).into()
}

pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}
