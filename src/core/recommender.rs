use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::core::matcher::{rank, Matcher};
use crate::models::{InternshipDetail, MatchScore, UserProfile};
use crate::services::store::{MatchStore, StoreError};

/// Errors from the id-based scoring paths
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Internship not found: {0}")]
    InternshipNotFound(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Fetches records through a [`MatchStore`] and scores them with a [`Matcher`].
///
/// # Ranking pipeline
/// 1. Load the user (a missing user fails the whole request)
/// 2. List active internship ids
/// 3. Fetch and score each internship concurrently, bounded by
///    `fetch_concurrency`; a failed item becomes a zero-score placeholder
/// 4. Stable sort by score and truncate
pub struct Recommender<S: MatchStore> {
    store: Arc<S>,
    matcher: Matcher,
    fetch_concurrency: usize,
}

impl<S: MatchStore> Clone for Recommender<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            matcher: self.matcher.clone(),
            fetch_concurrency: self.fetch_concurrency,
        }
    }
}

impl<S: MatchStore> Recommender<S> {
    pub fn new(store: Arc<S>, matcher: Matcher, fetch_concurrency: usize) -> Self {
        Self {
            store,
            matcher,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Score one internship for one user
    pub async fn match_score(&self, user_id: Uuid, internship_id: Uuid) -> Result<MatchScore, MatchError> {
        let user = self.load_user(user_id).await?;
        let internship = self
            .store
            .fetch_internship(internship_id)
            .await?
            .ok_or(MatchError::InternshipNotFound(internship_id))?;

        Ok(self.matcher.score(&user, &internship))
    }

    /// Best `limit` active internships for a user, highest score first
    pub async fn top_recommendations(&self, user_id: Uuid, limit: usize) -> Result<Vec<MatchScore>, MatchError> {
        let user = Arc::new(self.load_user(user_id).await?);
        let ids = self.store.active_internship_ids().await?;

        tracing::debug!("Scoring {} active internships for user {}", ids.len(), user_id);

        let scores = self.score_each(user, &ids).await;
        Ok(rank(scores, limit))
    }

    /// Score an already fetched candidate set for a user
    pub async fn rank_for_user(
        &self,
        user_id: Uuid,
        candidates: Vec<InternshipDetail>,
        limit: usize,
    ) -> Result<Vec<(InternshipDetail, MatchScore)>, MatchError> {
        let user = self.load_user(user_id).await?;
        Ok(self.matcher.rank_candidates(&user, candidates, limit))
    }

    async fn load_user(&self, user_id: Uuid) -> Result<UserProfile, MatchError> {
        self.store
            .fetch_user_profile(user_id)
            .await?
            .ok_or(MatchError::UserNotFound(user_id))
    }

    /// One score per id, in id order. Items that fail keep the placeholder.
    async fn score_each(&self, user: Arc<UserProfile>, ids: &[Uuid]) -> Vec<MatchScore> {
        let mut results: Vec<MatchScore> = ids.iter().copied().map(MatchScore::unavailable).collect();
        let permits = Arc::new(Semaphore::new(self.fetch_concurrency));
        let mut tasks = JoinSet::new();

        for (idx, &internship_id) in ids.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let matcher = self.matcher.clone();
            let user = Arc::clone(&user);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = match store.fetch_internship(internship_id).await {
                    Ok(Some(internship)) => Ok(matcher.score(&user, &internship)),
                    Ok(None) => Err(MatchError::InternshipNotFound(internship_id)),
                    Err(e) => Err(MatchError::Store(e)),
                };
                (idx, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(score))) => results[idx] = score,
                Ok((idx, Err(e))) => {
                    tracing::warn!("Error calculating score for internship {}: {}", ids[idx], e);
                }
                Err(e) => {
                    tracing::error!("Scoring task aborted: {}", e);
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Knows no users and lists two internship ids it cannot fetch
    struct EmptyStore {
        ids: Vec<Uuid>,
    }

    #[async_trait]
    impl MatchStore for EmptyStore {
        async fn fetch_user_profile(&self, _user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
            Ok(None)
        }

        async fn fetch_internship(&self, _internship_id: Uuid) -> Result<Option<InternshipDetail>, StoreError> {
            Ok(None)
        }

        async fn active_internship_ids(&self) -> Result<Vec<Uuid>, StoreError> {
            Ok(self.ids.clone())
        }
    }

    #[test]
    fn test_unknown_user_fails_before_listing() {
        let store = Arc::new(EmptyStore {
            ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        });
        let recommender = Recommender::new(store, Matcher::default(), 0);
        let user_id = Uuid::new_v4();

        let result = tokio_test::block_on(recommender.top_recommendations(user_id, 5));

        assert!(matches!(result, Err(MatchError::UserNotFound(id)) if id == user_id));
    }

    #[test]
    fn test_concurrency_floor_is_one() {
        let store = Arc::new(EmptyStore { ids: vec![] });
        let recommender = Recommender::new(store, Matcher::default(), 0);
        assert_eq!(recommender.fetch_concurrency, 1);
    }
}
