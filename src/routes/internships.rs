use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::requests::pagination;
use crate::models::{
    CreateInternshipRequest, InternshipListQuery, InternshipListResponse, InternshipView, MessageResponse,
    Pagination, SavedInternship, UpdateInternshipRequest,
};
use crate::routes::{AppState, AuthUser};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/internships")
            .route("", web::get().to(list_internships))
            .route("", web::post().to(create_internship))
            .route("/saved/list", web::get().to(saved_internships))
            .route("/{id}", web::get().to(get_internship))
            .route("/{id}", web::put().to(update_internship))
            .route("/{id}", web::delete().to(delete_internship))
            .route("/{id}/save", web::post().to(toggle_save)),
    );
}

/// GET /api/v1/internships
///
/// Active postings, newest first, narrowed by the optional query filters.
async fn list_internships(
    state: web::Data<AppState>,
    auth: Option<AuthUser>,
    query: web::Query<InternshipListQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, limit, offset) = pagination(query.page, query.limit, state.page_limit_cap());

    if let Some(user) = &auth {
        tracing::debug!("Listing internships for user {}", user.user_id);
    }

    let (internships, total) = state.postgres.list_internships(&query, limit, offset).await?;

    Ok(HttpResponse::Ok().json(InternshipListResponse {
        internships,
        pagination: Pagination::new(page, limit, total),
    }))
}

async fn get_internship(
    state: web::Data<AppState>,
    auth: Option<AuthUser>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let internship_id = path.into_inner();
    let internship = state
        .postgres
        .get_internship(internship_id)
        .await?
        .ok_or_else(|| AppError::not_found("Internship"))?;

    let is_saved = match auth {
        Some(user) => Some(state.postgres.is_saved(user.user_id, internship_id).await?),
        None => None,
    };

    Ok(HttpResponse::Ok().json(json!({
        "internship": InternshipView { internship, is_saved },
    })))
}

async fn create_internship(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateInternshipRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    if state.postgres.get_company(req.company_id).await?.is_none() {
        return Err(AppError::not_found("Company"));
    }

    let internship = state.postgres.create_internship(&req).await?;

    tracing::info!("User {} posted internship {}", auth.user_id, internship.id());

    Ok(HttpResponse::Created().json(json!({
        "message": "Internship created successfully",
        "internship": internship,
    })))
}

async fn update_internship(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateInternshipRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let internship = state
        .postgres
        .update_internship(path.into_inner(), &req)
        .await?
        .ok_or_else(|| AppError::not_found("Internship"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Internship updated successfully",
        "internship": internship,
    })))
}

/// DELETE /api/v1/internships/{id}
///
/// Soft delete. The posting stays in the database with `active = false`.
async fn delete_internship(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let internship_id = path.into_inner();
    if !state.postgres.deactivate_internship(internship_id).await? {
        return Err(AppError::not_found("Internship"));
    }

    tracing::info!("User {} deactivated internship {}", auth.user_id, internship_id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Internship deleted successfully")))
}

async fn toggle_save(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let internship_id = path.into_inner();
    if state.postgres.get_internship(internship_id).await?.is_none() {
        return Err(AppError::not_found("Internship"));
    }

    let saved = state.postgres.toggle_saved(auth.user_id, internship_id).await?;
    let message = if saved {
        "Internship saved successfully"
    } else {
        "Internship removed from saved"
    };

    Ok(HttpResponse::Ok().json(json!({ "message": message, "saved": saved })))
}

async fn saved_internships(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let saved: Vec<SavedInternship> = state
        .postgres
        .saved_internships(auth.user_id)
        .await?
        .into_iter()
        .map(|(internship, saved_at)| SavedInternship { internship, saved_at })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "savedInternships": saved })))
}
