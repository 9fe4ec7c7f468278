use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl_hours() -> i64 { 24 * 7 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_recommendation_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Upper bound on concurrent per-internship fetches in the ranking path
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_recommendation_limit(),
            max_limit: default_max_limit(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

fn default_recommendation_limit() -> usize { 5 }
fn default_max_limit() -> usize { 100 }
fn default_fetch_concurrency() -> usize { 16 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_high_demand_skills")]
    pub high_demand_skills: Vec<String>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            high_demand_skills: default_high_demand_skills(),
        }
    }
}

pub fn default_high_demand_skills() -> Vec<String> {
    ["javascript", "python", "react", "machine learning", "data analysis"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_skills_weight")]
    pub skills: f64,
    #[serde(default = "default_interests_weight")]
    pub interests: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_remote_weight")]
    pub remote: f64,
    #[serde(default = "default_education_weight")]
    pub education: f64,
    #[serde(default = "default_profile_weight")]
    pub profile: f64,
    #[serde(default = "default_high_demand_per_skill")]
    pub high_demand_per_skill: f64,
    #[serde(default = "default_high_demand_cap")]
    pub high_demand_cap: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            skills: default_skills_weight(),
            interests: default_interests_weight(),
            location: default_location_weight(),
            remote: default_remote_weight(),
            education: default_education_weight(),
            profile: default_profile_weight(),
            high_demand_per_skill: default_high_demand_per_skill(),
            high_demand_cap: default_high_demand_cap(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(w: &WeightsConfig) -> Self {
        Self {
            skills: w.skills,
            interests: w.interests,
            location: w.location,
            remote: w.remote,
            education: w.education,
            profile: w.profile,
            high_demand_per_skill: w.high_demand_per_skill,
            high_demand_cap: w.high_demand_cap,
        }
    }
}

fn default_skills_weight() -> f64 { 40.0 }
fn default_interests_weight() -> f64 { 25.0 }
fn default_location_weight() -> f64 { 15.0 }
fn default_remote_weight() -> f64 { 10.0 }
fn default_education_weight() -> f64 { 10.0 }
fn default_profile_weight() -> f64 { 10.0 }
fn default_high_demand_per_skill() -> f64 { 2.0 }
fn default_high_demand_cap() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with INTERNMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., INTERNMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("INTERNMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("INTERNMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Apply the conventional `DATABASE_URL` and `JWT_SECRET` variables on top
/// of whatever the layered sources produced
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}
