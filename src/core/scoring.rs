use crate::core::overlap::{locations_match, matched_terms, normalize};
use crate::models::{InternshipDetail, MatchScore, ScoringWeights, UserProfile};

/// Calculate a match score (0-100) between a user profile and an internship.
///
/// Scoring formula (default weights):
/// score = (
///     skill_overlap * 40 +        # matching user skills / required skills
///     interest_overlap * 25 +     # matching user interests / internship tags
///     location (15 | remote 10) +
///     education 10 +              # university and major both set
///     profile 10 +                # profile marked complete
///     min(high_demand * 2, 10)    # bonus, may push past 100 before clamping
/// )
///
/// Overlap ratios count user-side matches and are not capped at 1, so a user
/// whose several skills hit one requirement can earn more than the nominal
/// weight. Only the final total is clamped.
///
/// Reasons are emitted in the order the components are evaluated, followed
/// by one qualitative band.
pub fn calculate_match_score(
    user: &UserProfile,
    internship: &InternshipDetail,
    weights: &ScoringWeights,
    high_demand_skills: &[String],
) -> MatchScore {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    let user_skills = normalize(user.skill_names());

    // Skills
    let required_skills = normalize(internship.skill_names());
    let matched_skills = matched_terms(&user_skills, &required_skills);
    if required_skills.is_empty() {
        total += weights.skills;
        reasons.push("No specific skills required".to_string());
    } else {
        total += overlap_ratio(matched_skills.len(), required_skills.len()) * weights.skills;
        if matched_skills.is_empty() {
            reasons.push("Skills gap: Consider developing required skills".to_string());
        } else {
            reasons.push(format!(
                "You have {} out of {} required skills",
                matched_skills.len(),
                required_skills.len()
            ));
        }
    }

    // Interests
    let user_interests = normalize(user.interest_names());
    let tags = normalize(internship.interest_names());
    let matched_interests = matched_terms(&user_interests, &tags);
    let interest_ratio = if tags.is_empty() {
        1.0
    } else {
        overlap_ratio(matched_interests.len(), tags.len())
    };
    total += interest_ratio * weights.interests;
    if !matched_interests.is_empty() {
        reasons.push(format!(
            "Your interests align with {} of the internship's focus areas",
            matched_interests.len()
        ));
    }

    // Location
    let (location_points, location_reason) = location_component(user, internship, weights);
    total += location_points;
    if let Some(reason) = location_reason {
        reasons.push(reason.to_string());
    }

    // Education
    if user.user.has_education() {
        total += weights.education;
        reasons.push("Educational background is suitable".to_string());
    }

    // Profile completeness
    if user.user.profile_complete {
        total += weights.profile;
        reasons.push("Complete profile gives you an advantage".to_string());
    } else {
        reasons.push("Complete your profile for better matches".to_string());
    }

    // High-demand bonus
    let keywords = normalize(high_demand_skills.iter().map(String::as_str));
    let high_demand = matched_terms(&user_skills, &keywords).len();
    if high_demand > 0 {
        total += (high_demand as f64 * weights.high_demand_per_skill).min(weights.high_demand_cap);
        reasons.push(format!("You have {} high-demand skills", high_demand));
    }

    let score = clamp_score(total);
    reasons.push(band_reason(score).to_string());

    MatchScore {
        internship_id: internship.id(),
        score,
        reasons,
    }
}

#[inline]
fn overlap_ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    matched as f64 / total as f64
}

fn location_component(
    user: &UserProfile,
    internship: &InternshipDetail,
    weights: &ScoringWeights,
) -> (f64, Option<&'static str>) {
    let remote = internship.internship.remote;
    let user_location = user
        .user
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    let internship_location = Some(internship.internship.location.trim()).filter(|l| !l.is_empty());

    match (user_location, internship_location) {
        (Some(mine), Some(theirs)) => {
            if locations_match(mine, theirs) {
                (weights.location, Some("Location matches your preference"))
            } else if remote {
                (weights.remote, Some("Remote opportunity available"))
            } else {
                (0.0, Some("Location may require relocation"))
            }
        }
        _ if remote => (weights.remote, Some("Remote opportunity available")),
        _ => (0.0, None),
    }
}

/// Round to the nearest integer and clamp into 0..=100
#[inline]
pub fn clamp_score(total: f64) -> u8 {
    if !total.is_finite() {
        return 0;
    }
    total.round().clamp(0.0, 100.0) as u8
}

/// Qualitative band appended as the final reason
pub fn band_reason(score: u8) -> &'static str {
    match score {
        90..=u8::MAX => "Excellent match!",
        80..=89 => "Great match!",
        70..=79 => "Good match with room for improvement",
        50..=69 => "Moderate match - consider skill development",
        _ => "Low match - focus on required skills and interests",
    }
}
