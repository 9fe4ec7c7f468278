// Core algorithm exports
pub mod matcher;
pub mod overlap;
pub mod recommender;
pub mod scoring;

pub use matcher::{rank, Matcher};
pub use overlap::{locations_match, matched_terms, terms_match};
pub use recommender::{MatchError, Recommender};
pub use scoring::{band_reason, calculate_match_score, clamp_score};
