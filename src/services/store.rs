use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InternshipDetail, UserProfile};

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Read access the recommender needs.
///
/// `PostgresClient` is the production implementation; tests supply
/// in-memory stores.
#[async_trait]
pub trait MatchStore: Send + Sync + 'static {
    /// User with skills and interests, `None` when the id is unknown
    async fn fetch_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Internship with company, skills and interests, `None` when unknown
    async fn fetch_internship(&self, internship_id: Uuid) -> Result<Option<InternshipDetail>, StoreError>;

    /// Ids of all active internships, newest posting first
    async fn active_internship_ids(&self) -> Result<Vec<Uuid>, StoreError>;
}
