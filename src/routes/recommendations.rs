use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CategoryRecommendationsResponse, InternshipDetail, LimitQuery, MatchScore, MatchScoreResponse,
    RecommendationsResponse, RecommendedInternship, SimilarResponse, TrendingResponse,
};
use crate::routes::{AppState, AuthUser};

/// Window used by the trending endpoint
const TRENDING_WINDOW_DAYS: i64 = 7;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recommendations")
            .route("", web::get().to(recommendations))
            .route("/match/{internship_id}", web::get().to(match_score))
            .route("/category/{category}", web::get().to(category_recommendations))
            .route("/trending", web::get().to(trending))
            .route("/similar/{internship_id}", web::get().to(similar)),
    );
}

/// GET /api/v1/recommendations?limit=5
///
/// Scores every active internship for the caller and returns the best
/// `limit`, each enriched with bookmark and application state.
async fn recommendations(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = state.recommendation_limit(query.limit);

    tracing::info!("Computing recommendations for user {}, limit {}", auth.user_id, limit);

    let scores = state.recommender.top_recommendations(auth.user_id, limit).await?;

    let mut recommendations = Vec::with_capacity(scores.len());
    for score in scores {
        // Placeholders for internships that vanished mid-request are skipped
        let Some(internship) = state.postgres.get_internship(score.internship_id).await? else {
            continue;
        };
        let is_saved = state.postgres.is_saved(auth.user_id, score.internship_id).await?;
        let has_applied = state.postgres.has_applied(auth.user_id, score.internship_id).await?;

        recommendations.push(recommended(internship, score, is_saved, Some(has_applied)));
    }

    Ok(HttpResponse::Ok().json(RecommendationsResponse {
        total: recommendations.len(),
        recommendations,
    }))
}

async fn match_score(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let internship_id = path.into_inner();
    let score = state.recommender.match_score(auth.user_id, internship_id).await?;

    Ok(HttpResponse::Ok().json(MatchScoreResponse {
        internship_id,
        match_percentage: score.score,
        reasons: score.reasons,
    }))
}

/// GET /api/v1/recommendations/category/{category}
///
/// Scores up to twice `limit` candidates tagged with the category and keeps
/// the best `limit`.
async fn category_recommendations(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let category = path.into_inner();
    let limit = state.recommendation_limit(query.limit);

    let candidates = state
        .postgres
        .internships_by_category(&category, (limit * 2) as i64)
        .await?;

    tracing::debug!("{} candidates for category '{}'", candidates.len(), category);

    let ranked = state.recommender.rank_for_user(auth.user_id, candidates, limit).await?;

    let mut recommendations = Vec::with_capacity(ranked.len());
    for (internship, score) in ranked {
        let is_saved = state.postgres.is_saved(auth.user_id, internship.id()).await?;
        recommendations.push(recommended(internship, score, is_saved, None));
    }

    Ok(HttpResponse::Ok().json(CategoryRecommendationsResponse {
        category,
        total: recommendations.len(),
        recommendations,
    }))
}

async fn trending(state: web::Data<AppState>, query: web::Query<LimitQuery>) -> Result<HttpResponse, AppError> {
    let limit = state.recommendation_limit(query.limit);
    let since = Utc::now() - Duration::days(TRENDING_WINDOW_DAYS);

    let trending_internships = state.postgres.trending_internships(since, limit as i64).await?;

    Ok(HttpResponse::Ok().json(TrendingResponse {
        total: trending_internships.len(),
        trending_internships,
    }))
}

async fn similar(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = state.recommendation_limit(query.limit);

    let similar_internships = state
        .postgres
        .similar_internships(path.into_inner(), limit as i64)
        .await?
        .ok_or_else(|| AppError::not_found("Internship"))?;

    Ok(HttpResponse::Ok().json(SimilarResponse {
        total: similar_internships.len(),
        similar_internships,
    }))
}

fn recommended(
    internship: InternshipDetail,
    score: MatchScore,
    is_saved: bool,
    has_applied: Option<bool>,
) -> RecommendedInternship {
    RecommendedInternship {
        internship,
        match_percentage: score.score,
        match_reasons: score.reasons,
        is_saved,
        has_applied,
    }
}
