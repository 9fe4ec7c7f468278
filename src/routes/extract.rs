use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::JwtManager;

/// Caller identity taken from a valid `Authorization: Bearer` token.
///
/// Use `Option<AuthUser>` on endpoints where authentication is optional;
/// a missing or invalid token then yields `None` instead of a 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let jwt = req
        .app_data::<web::Data<JwtManager>>()
        .ok_or_else(|| AppError::Internal("JWT manager not configured".to_string()))?;

    let token = bearer_token(req).ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

    let claims = jwt.validate_token(token).map_err(|e| {
        tracing::debug!("Rejected token on {}: {}", req.path(), e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    })
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
