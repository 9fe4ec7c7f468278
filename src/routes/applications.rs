use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::requests::pagination;
use crate::models::{
    ApplicationListQuery, ApplicationListResponse, CreateApplicationRequest, MessageResponse, Pagination,
    UpdateApplicationRequest,
};
use crate::routes::{AppState, AuthUser};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/applications")
            .route("", web::get().to(list_applications))
            .route("", web::post().to(create_application))
            .route("/stats/summary", web::get().to(application_stats))
            .route("/{id}", web::get().to(get_application))
            .route("/{id}", web::put().to(update_application))
            .route("/{id}", web::delete().to(withdraw_application)),
    );
}

async fn list_applications(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ApplicationListQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, limit, offset) = pagination(query.page, query.limit, state.page_limit_cap());

    let (applications, total) = state
        .postgres
        .list_applications(auth.user_id, query.status, limit, offset)
        .await?;

    Ok(HttpResponse::Ok().json(ApplicationListResponse {
        applications,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// POST /api/v1/applications
///
/// The internship must exist and still be active. A second application to
/// the same internship is rejected.
async fn create_application(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateApplicationRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let internship = state
        .postgres
        .get_internship(req.internship_id)
        .await?
        .ok_or_else(|| AppError::not_found("Internship"))?;

    if !internship.internship.active {
        return Err(AppError::BadRequest("This internship is no longer available".to_string()));
    }

    let application = state.postgres.create_application(auth.user_id, &req).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Application submitted successfully",
        "application": application,
    })))
}

async fn get_application(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let application = state
        .postgres
        .get_application(auth.user_id, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Application"))?;

    Ok(HttpResponse::Ok().json(json!({ "application": application })))
}

async fn update_application(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateApplicationRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let application = state
        .postgres
        .update_application(auth.user_id, path.into_inner(), &req)
        .await?
        .ok_or_else(|| AppError::not_found("Application"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Application updated successfully",
        "application": application,
    })))
}

async fn withdraw_application(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !state.postgres.withdraw_application(auth.user_id, path.into_inner()).await? {
        return Err(AppError::not_found("Application"));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Application withdrawn successfully")))
}

async fn application_stats(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, AppError> {
    let stats = state.postgres.application_stats(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}
