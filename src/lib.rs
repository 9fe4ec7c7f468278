//! InternMatch - internship discovery and recommendation service
//!
//! The crate exposes the match scorer and ranking pipeline used by the
//! HTTP service, along with the persistence layer and route handlers.

pub mod config;
pub mod core;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{calculate_match_score, MatchError, Matcher, Recommender};
pub use crate::errors::AppError;
pub use crate::models::{InternshipDetail, MatchScore, ScoringWeights, UserProfile};
pub use crate::services::{MatchStore, StoreError};
