use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{AuthResponse, LoginRequest, SignupRequest};
use crate::routes::{AppState, AuthUser};
use crate::services::{hash_password, verify_password, JwtManager, NewUser};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/verify", web::get().to(verify)),
    );
}

/// POST /api/v1/auth/signup
async fn signup(
    state: web::Data<AppState>,
    jwt: web::Data<JwtManager>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    if state.postgres.email_exists(&req.email).await? {
        return Err(AppError::BadRequest("User with this email already exists".to_string()));
    }

    let password_hash = hash_blocking(req.password.clone()).await?;
    let user = state
        .postgres
        .create_user(NewUser {
            email: &req.email,
            password_hash: &password_hash,
            first_name: &req.first_name,
            last_name: &req.last_name,
            phone: req.phone.as_deref(),
        })
        .await?;

    let token = jwt.generate_token(user.id, &user.email)?;

    tracing::info!("New user signed up: {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User created successfully".to_string(),
        user,
        token,
    }))
}

/// POST /api/v1/auth/login
async fn login(
    state: web::Data<AppState>,
    jwt: web::Data<JwtManager>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (user, password_hash) = state.postgres.find_credentials(&req.email).await?.ok_or_else(invalid)?;

    if !verify_blocking(req.password.clone(), password_hash).await? {
        tracing::info!("Failed login attempt for user {}", user.id);
        return Err(invalid());
    }

    let token = jwt.generate_token(user.id, &user.email)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        user,
        token,
    }))
}

/// Argon2 hashing runs on the blocking thread pool, off the actix worker
async fn hash_blocking(password: String) -> Result<String, AppError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool, AppError> {
    web::block(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// GET /api/v1/auth/me
async fn me(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let profile = state
        .postgres
        .get_user_profile(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(json!({ "user": profile })))
}

/// GET /api/v1/auth/verify
async fn verify(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let user = state
        .postgres
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "valid": true, "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_password_hashing_off_the_worker() {
        let hash = hash_blocking("hunter22".to_string()).await.unwrap();
        assert_ne!(hash, "hunter22");

        assert!(verify_blocking("hunter22".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_blocking("hunter23".to_string(), hash).await.unwrap());
    }

    #[actix_web::test]
    async fn test_malformed_hash_is_rejected() {
        let err = verify_blocking("hunter22".to_string(), "not-a-phc-string".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
