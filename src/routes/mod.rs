// Route exports
pub mod applications;
pub mod auth;
pub mod extract;
pub mod health;
pub mod internships;
pub mod profile;
pub mod recommendations;

use std::sync::Arc;

use actix_web::web;

use crate::config::MatchingSettings;
use crate::core::Recommender;
use crate::services::PostgresClient;

pub use extract::AuthUser;

/// Application state shared across all handlers.
///
/// The `JwtManager` is registered as its own `web::Data` so the
/// [`AuthUser`] extractor can reach it without knowing about this type.
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub recommender: Recommender<PostgresClient>,
    pub matching: MatchingSettings,
}

impl AppState {
    /// Clamp a `?limit=` value to the configured bounds
    pub fn recommendation_limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|l| *l > 0)
            .unwrap_or(self.matching.default_limit)
            .min(self.matching.max_limit)
    }

    pub fn page_limit_cap(&self) -> i64 {
        self.matching.max_limit as i64
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(auth::configure)
            .configure(profile::configure)
            .configure(internships::configure)
            .configure(applications::configure)
            .configure(recommendations::configure),
    );
}
