use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{AddInterestRequest, AddSkillRequest, MessageResponse, UpdateProfileRequest};
use crate::routes::{AppState, AuthUser};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .route("", web::get().to(get_profile))
            .route("", web::put().to(update_profile))
            .route("/skills", web::post().to(add_skill))
            .route("/skills/{skill_id}", web::delete().to(remove_skill))
            .route("/interests", web::post().to(add_interest))
            .route("/interests/{interest_id}", web::delete().to(remove_interest))
            .route("/available-skills", web::get().to(available_skills))
            .route("/available-interests", web::get().to(available_interests))
            .route("/complete", web::post().to(complete_profile)),
    );
}

async fn get_profile(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let profile = state
        .postgres
        .get_user_profile(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(json!({ "user": profile })))
}

/// PUT /api/v1/profile
///
/// Partial update. A changed email must not belong to another account.
async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    if let Some(email) = req.email.as_deref() {
        if state.postgres.email_taken_by_other(email, auth.user_id).await? {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }
    }

    state
        .postgres
        .update_user(auth.user_id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let profile = state
        .postgres
        .get_user_profile(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully",
        "user": profile,
    })))
}

async fn add_skill(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<AddSkillRequest>,
) -> Result<HttpResponse, AppError> {
    let skill_id = req
        .skill_id
        .ok_or_else(|| AppError::BadRequest("Skill ID is required".to_string()))?;

    let skill = state
        .postgres
        .get_skill(skill_id)
        .await?
        .ok_or_else(|| AppError::not_found("Skill"))?;

    let user_skill = state.postgres.add_user_skill(auth.user_id, skill, req.level).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Skill added successfully",
        "userSkill": user_skill,
    })))
}

async fn remove_skill(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !state.postgres.remove_user_skill(auth.user_id, path.into_inner()).await? {
        return Err(AppError::NotFound("Skill not found in profile".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Skill removed successfully")))
}

async fn add_interest(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<AddInterestRequest>,
) -> Result<HttpResponse, AppError> {
    let interest_id = req
        .interest_id
        .ok_or_else(|| AppError::BadRequest("Interest ID is required".to_string()))?;

    let interest = state
        .postgres
        .get_interest(interest_id)
        .await?
        .ok_or_else(|| AppError::not_found("Interest"))?;

    let interest = state.postgres.add_user_interest(auth.user_id, interest).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Interest added successfully",
        "userInterest": interest,
    })))
}

async fn remove_interest(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !state.postgres.remove_user_interest(auth.user_id, path.into_inner()).await? {
        return Err(AppError::NotFound("Interest not found in profile".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Interest removed successfully")))
}

async fn available_skills(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let skills = state.postgres.list_skills().await?;
    Ok(HttpResponse::Ok().json(json!({ "skills": skills })))
}

async fn available_interests(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let interests = state.postgres.list_interests().await?;
    Ok(HttpResponse::Ok().json(json!({ "interests": interests })))
}

/// POST /api/v1/profile/complete
async fn complete_profile(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let user = state
        .postgres
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !user.has_required_fields() {
        return Err(AppError::BadRequest(
            "Please complete all required fields before marking profile as complete".to_string(),
        ));
    }

    state.postgres.mark_profile_complete(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Profile marked as complete")))
}
