use std::sync::Arc;

use crate::config::default_high_demand_skills;
use crate::core::scoring::calculate_match_score;
use crate::models::{InternshipDetail, MatchScore, ScoringWeights, UserProfile};

/// Scores internships for a user and ranks the results.
///
/// Cheap to clone; the keyword list is shared.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    high_demand_skills: Arc<[String]>,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, high_demand_skills: Vec<String>) -> Self {
        Self {
            weights,
            high_demand_skills: high_demand_skills.into(),
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), default_high_demand_skills())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a single internship for a user
    pub fn score(&self, user: &UserProfile, internship: &InternshipDetail) -> MatchScore {
        calculate_match_score(user, internship, &self.weights, &self.high_demand_skills)
    }

    /// Score every candidate and keep the best `limit`, pairing each score
    /// with its internship
    pub fn rank_candidates(
        &self,
        user: &UserProfile,
        candidates: Vec<InternshipDetail>,
        limit: usize,
    ) -> Vec<(InternshipDetail, MatchScore)> {
        let mut scored: Vec<(InternshipDetail, MatchScore)> = candidates
            .into_iter()
            .map(|internship| {
                let score = self.score(user, &internship);
                (internship, score)
            })
            .collect();

        // Stable sort: equal scores keep candidate order
        scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
        scored.truncate(limit);
        scored
    }
}

/// Sort scores descending and keep the first `limit`.
///
/// The sort is stable, so ties keep their input order.
pub fn rank(mut scores: Vec<MatchScore>, limit: usize) -> Vec<MatchScore> {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores.truncate(limit);
    scores
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn score(n: u8) -> MatchScore {
        MatchScore {
            internship_id: Uuid::new_v4(),
            score: n,
            reasons: vec![],
        }
    }

    #[test]
    fn test_rank_sorts_descending_and_truncates() {
        let scores = vec![score(10), score(90), score(50), score(70)];

        let ranked = rank(scores, 3);

        let values: Vec<u8> = ranked.iter().map(|s| s.score).collect();
        assert_eq!(values, vec![90, 70, 50]);
    }

    #[test]
    fn test_rank_keeps_input_order_on_ties() {
        let first = score(60);
        let second = score(60);
        let third = score(80);
        let (first_id, second_id) = (first.internship_id, second.internship_id);

        let ranked = rank(vec![first, second, third], 10);

        assert_eq!(ranked[1].internship_id, first_id);
        assert_eq!(ranked[2].internship_id, second_id);
    }

    #[test]
    fn test_rank_with_zero_limit() {
        assert!(rank(vec![score(1)], 0).is_empty());
    }

    #[test]
    fn test_default_matcher_uses_default_weights() {
        let matcher = Matcher::default();
        assert_eq!(*matcher.weights(), ScoringWeights::default());
    }
}
