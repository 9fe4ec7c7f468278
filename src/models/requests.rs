use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::{ApplicationStatus, SkillLevel};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom(function = "phone_number", message = "Please provide a valid phone number"))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank", message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "not_blank", message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "phone_number", message = "Please provide a valid phone number"))]
    pub phone: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    #[validate(custom(function = "self::graduation_year", message = "Graduation year must be between 2024 and 2035"))]
    pub graduation_year: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[validate(range(min = 16, max = 100, message = "Age must be between 16 and 100"))]
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSkillRequest {
    pub skill_id: Option<Uuid>,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInterestRequest {
    pub interest_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternshipRequest {
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters long"))]
    pub description: String,
    pub company_id: Uuid,
    #[validate(custom(function = "not_blank", message = "Location is required"))]
    pub location: String,
    #[validate(custom(function = "not_blank", message = "Duration is required"))]
    pub duration: String,
    pub salary: Option<String>,
    #[validate(length(min = 1, message = "At least one requirement is needed"))]
    pub requirements: Vec<String>,
    pub team_size: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
    #[serde(default)]
    pub interest_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternshipRequest {
    #[validate(custom(function = "not_blank", message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters long"))]
    pub description: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub team_size: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub remote: Option<bool>,
    pub active: Option<bool>,
}

/// Query string of `GET /internships`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InternshipListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub location: Option<String>,
    pub remote: Option<bool>,
    pub company: Option<String>,
    pub skills: Option<String>,
    pub interests: Option<String>,
    pub search: Option<String>,
}

impl InternshipListQuery {
    /// Comma separated skill names, trimmed and without blanks
    pub fn skill_list(&self) -> Vec<String> {
        split_csv(self.skills.as_deref())
    }

    pub fn interest_list(&self) -> Vec<String> {
        split_csv(self.interests.as_deref())
    }
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub internship_id: Uuid,
    #[validate(length(max = 1000, message = "Notes must be less than 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 5000, message = "Cover letter must be less than 5000 characters"))]
    pub cover_letter: Option<String>,
    #[validate(url(message = "Valid resume URL is required"))]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    pub status: Option<ApplicationStatus>,
    #[validate(length(max = 1000, message = "Notes must be less than 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 5000, message = "Cover letter must be less than 5000 characters"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `?limit=` on the recommendation endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn phone_number(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || !(7..=15).contains(&digits) {
        return Err(ValidationError::new("phone"));
    }
    Ok(())
}

fn graduation_year(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<i32>() {
        Ok(year) if (2024..=2035).contains(&year) && value.trim().len() == 4 => Ok(()),
        _ => Err(ValidationError::new("graduation_year")),
    }
}

/// Clamp `page`/`limit` query values into a usable `(page, limit, offset)`
///
/// The offset saturates instead of overflowing on absurd page numbers; such a
/// page is simply empty.
pub fn pagination(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> (i64, i64, i64) {
    let max_limit = max_limit.max(1);
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, max_limit);
    (page, limit, (page - 1).saturating_mul(limit))
}

/// Normalised form of an email address used for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
