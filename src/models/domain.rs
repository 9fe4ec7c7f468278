use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Registered student account with profile attributes
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True when both university and major carry a non-blank value
    pub fn has_education(&self) -> bool {
        is_filled(&self.university) && is_filled(&self.major)
    }

    /// Fields required before a profile may be marked complete
    pub fn has_required_fields(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && !self.email.trim().is_empty()
            && self.has_education()
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Proficiency a user claims for a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Catalogue skill
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Catalogue interest area
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSkill {
    pub skill: Skill,
    pub level: SkillLevel,
}

/// User together with skill and interest associations.
///
/// This is the user-side input of the match scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub skills: Vec<UserSkill>,
    pub interests: Vec<Interest>,
}

impl UserProfile {
    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.skill.name.as_str())
    }

    pub fn interest_names(&self) -> impl Iterator<Item = &str> {
        self.interests.iter().map(|i| i.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub industry: Option<String>,
}

/// Internship posting row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_id: Uuid,
    pub location: String,
    pub duration: String,
    pub salary: Option<String>,
    pub requirements: Json<Vec<String>>,
    pub team_size: Option<String>,
    pub rating: f64,
    pub applicants: i32,
    pub posted_date: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub remote: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternshipSkill {
    pub skill: Skill,
    pub required: bool,
}

/// Internship with its company, skill and interest associations.
///
/// This is the internship-side input of the match scorer and the shape
/// returned by the listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipDetail {
    #[serde(flatten)]
    pub internship: Internship,
    pub company: Company,
    pub skills: Vec<InternshipSkill>,
    pub interests: Vec<Interest>,
    pub application_count: i64,
    pub saved_count: i64,
}

impl InternshipDetail {
    pub fn id(&self) -> Uuid {
        self.internship.id
    }

    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.skill.name.as_str())
    }

    pub fn interest_names(&self) -> impl Iterator<Item = &str> {
        self.interests.iter().map(|i| i.name.as_str())
    }
}

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(format!(
                "Invalid status '{}': must be one of pending, accepted, rejected, withdrawn",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub internship_id: Uuid,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
}

/// Application joined with the internship it targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub internship: InternshipDetail,
}

/// Computed compatibility between a user and an internship. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub internship_id: Uuid,
    pub score: u8,
    pub reasons: Vec<String>,
}

impl MatchScore {
    /// Stand-in used when an internship could not be scored
    pub fn unavailable(internship_id: Uuid) -> Self {
        Self {
            internship_id,
            score: 0,
            reasons: vec!["Unable to calculate match score".to_string()],
        }
    }
}

/// Scoring weights, expressed in points out of 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub skills: f64,
    pub interests: f64,
    pub location: f64,
    pub remote: f64,
    pub education: f64,
    pub profile: f64,
    pub high_demand_per_skill: f64,
    pub high_demand_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 40.0,
            interests: 25.0,
            location: 15.0,
            remote: 10.0,
            education: 10.0,
            profile: 10.0,
            high_demand_per_skill: 2.0,
            high_demand_cap: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Pending".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Pending));
        assert_eq!("withdrawn".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Withdrawn));
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_default_weights_sum_to_hundred() {
        let w = ScoringWeights::default();
        assert_eq!(w.skills + w.interests + w.location + w.education + w.profile, 100.0);
    }

    #[test]
    fn test_match_score_serializes_camel_case() {
        let score = MatchScore::unavailable(Uuid::nil());
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["score"], 0);
        assert!(json.get("internshipId").is_some());
    }
}
