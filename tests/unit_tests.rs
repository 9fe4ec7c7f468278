// Unit tests for InternMatch

use chrono::Utc;
use intern_match::config::default_high_demand_skills;
use intern_match::core::{band_reason, calculate_match_score, clamp_score, locations_match, rank, terms_match};
use intern_match::models::{
    Company, Interest, Internship, InternshipDetail, InternshipSkill, MatchScore, ScoringWeights, Skill,
    SkillLevel, User, UserProfile, UserSkill,
};
use sqlx::types::Json;
use uuid::Uuid;

fn skill(name: &str) -> Skill {
    Skill {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
    }
}

fn interest(name: &str) -> Interest {
    Interest {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
    }
}

fn create_test_user(skills: &[&str], interests: &[&str], location: Option<&str>, complete: bool) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        user: User {
            id: Uuid::new_v4(),
            email: "student@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Student".to_string(),
            phone: None,
            university: Some("State University".to_string()),
            major: Some("Computer Science".to_string()),
            graduation_year: Some("2026".to_string()),
            location: location.map(str::to_string),
            bio: None,
            age: Some(21),
            profile_complete: complete,
            created_at: now,
            updated_at: now,
        },
        skills: skills
            .iter()
            .map(|s| UserSkill {
                skill: skill(s),
                level: SkillLevel::Intermediate,
            })
            .collect(),
        interests: interests.iter().map(|i| interest(i)).collect(),
    }
}

fn create_test_internship(skills: &[&str], interests: &[&str], location: &str, remote: bool) -> InternshipDetail {
    let now = Utc::now();
    let company_id = Uuid::new_v4();
    InternshipDetail {
        internship: Internship {
            id: Uuid::new_v4(),
            title: "Software Intern".to_string(),
            description: "Build things with the platform team".to_string(),
            company_id,
            location: location.to_string(),
            duration: "3 months".to_string(),
            salary: None,
            requirements: Json(vec!["Curiosity".to_string()]),
            team_size: None,
            rating: 4.5,
            applicants: 0,
            posted_date: now,
            deadline: None,
            remote,
            active: true,
            created_at: now,
            updated_at: now,
        },
        company: Company {
            id: company_id,
            name: "Acme".to_string(),
            description: None,
            website: None,
            logo: None,
            location: Some(location.to_string()),
            size: None,
            industry: Some("Software".to_string()),
        },
        skills: skills
            .iter()
            .map(|s| InternshipSkill {
                skill: skill(s),
                required: true,
            })
            .collect(),
        interests: interests.iter().map(|i| interest(i)).collect(),
        application_count: 0,
        saved_count: 0,
    }
}

fn score(user: &UserProfile, internship: &InternshipDetail) -> MatchScore {
    calculate_match_score(user, internship, &ScoringWeights::default(), &default_high_demand_skills())
}

#[test]
fn test_score_always_within_bounds() {
    let users = [
        create_test_user(&[], &[], None, false),
        create_test_user(&["Python", "JavaScript", "React", "Machine Learning", "Data Analysis", "SQL"], &["AI"], Some("Berlin"), true),
        create_test_user(&["Rust"], &["Systems"], Some("Lisbon"), true),
    ];
    let internships = [
        create_test_internship(&[], &[], "", false),
        create_test_internship(&["Python"], &["AI"], "Berlin", true),
        create_test_internship(&["Go", "Kubernetes"], &["Cloud", "DevOps"], "Tokyo", false),
    ];

    for user in &users {
        for internship in &internships {
            let result = score(user, internship);
            assert!(result.score <= 100, "score {} out of range", result.score);
            assert!(!result.reasons.is_empty());
            assert_eq!(result.internship_id, internship.id());
        }
    }
}

#[test]
fn test_full_overlap_beats_no_overlap() {
    let user = create_test_user(&["Rust", "SQL"], &["Backend"], Some("Berlin"), true);
    let full = create_test_internship(&["Rust", "SQL"], &["Backend"], "Berlin", false);
    let none = create_test_internship(&["Swift", "Kotlin"], &["Mobile"], "Berlin", false);

    assert!(score(&user, &full).score > score(&user, &none).score);
}

#[test]
fn test_skill_matching_is_case_insensitive_substring() {
    let user = create_test_user(&["react"], &[], None, false);
    let internship = create_test_internship(&["React Native"], &[], "", false);

    let result = score(&user, &internship);

    assert!(result.reasons.contains(&"You have 1 out of 1 required skills".to_string()));
}

#[test]
fn test_empty_required_skills_never_nan() {
    let user = create_test_user(&[], &[], None, false);
    let internship = create_test_internship(&[], &[], "Remote", false);

    let result = score(&user, &internship);

    // Full skill credit (40), full interest credit (25) and education (10)
    assert_eq!(result.score, 75);
    assert_eq!(result.reasons[0], "No specific skills required");
}

#[test]
fn test_band_reason_is_last() {
    let user = create_test_user(&["Rust"], &[], Some("Berlin"), true);
    let internship = create_test_internship(&["Rust"], &[], "Berlin", false);

    let result = score(&user, &internship);

    assert_eq!(result.reasons.last().map(String::as_str), Some(band_reason(result.score)));
}

#[test]
fn test_remote_fallback_when_locations_differ() {
    let user = create_test_user(&[], &[], Some("Paris"), false);
    let remote = create_test_internship(&[], &[], "London", true);
    let onsite = create_test_internship(&[], &[], "London", false);

    let remote_score = score(&user, &remote);
    let onsite_score = score(&user, &onsite);

    assert!(remote_score.reasons.contains(&"Remote opportunity available".to_string()));
    assert!(onsite_score.reasons.contains(&"Location may require relocation".to_string()));
    assert_eq!(remote_score.score - onsite_score.score, 10);
}

#[test]
fn test_custom_weights_change_outcome() {
    let user = create_test_user(&["Rust"], &[], None, false);
    let internship = create_test_internship(&["Rust"], &[], "", false);
    let skill_heavy = ScoringWeights {
        skills: 80.0,
        ..ScoringWeights::default()
    };

    let default_score = score(&user, &internship).score;
    let heavy_score = calculate_match_score(&user, &internship, &skill_heavy, &[]).score;

    assert!(heavy_score > default_score);
}

#[test]
fn test_clamp_and_bands() {
    assert_eq!(clamp_score(-4.0), 0);
    assert_eq!(clamp_score(99.5), 100);
    assert_eq!(clamp_score(135.0), 100);
    assert_eq!(clamp_score(f64::NAN), 0);

    assert_eq!(band_reason(95), "Excellent match!");
    assert_eq!(band_reason(80), "Great match!");
    assert_eq!(band_reason(50), "Moderate match - consider skill development");
}

#[test]
fn test_location_and_term_helpers() {
    assert!(locations_match("New York", "new york, ny"));
    assert!(!locations_match("Boston", "Austin"));
    assert!(terms_match("machine learning", "learning"));
    assert!(!terms_match("", ""));
}

#[test]
fn test_rank_orders_and_truncates() {
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let scores = vec![
        MatchScore { internship_id: ids[0], score: 40, reasons: vec![] },
        MatchScore { internship_id: ids[1], score: 90, reasons: vec![] },
        MatchScore { internship_id: ids[2], score: 40, reasons: vec![] },
        MatchScore { internship_id: ids[3], score: 70, reasons: vec![] },
    ];

    let ranked = rank(scores, 3);

    let order: Vec<Uuid> = ranked.iter().map(|s| s.internship_id).collect();
    assert_eq!(order, vec![ids[1], ids[3], ids[0]]);
}

#[test]
fn test_extra_matching_skills_raise_score_past_weight() {
    let mut user = create_test_user(&["Java", "JavaScript"], &["Physics"], Some("Delhi"), false);
    user.user.university = None;
    user.user.major = None;
    let internship = create_test_internship(&["JavaScript"], &["Finance"], "Mumbai", false);

    let result = score(&user, &internship);

    // 2/1 * 40 skills + 4 high-demand bonus ("java" and "javascript")
    assert_eq!(result.score, 84);
    assert_eq!(result.reasons[0], "You have 2 out of 1 required skills");
    assert!(result.reasons.contains(&"You have 2 high-demand skills".to_string()));
    assert_eq!(result.reasons.last().map(String::as_str), Some("Great match!"));
}

#[test]
fn test_extra_matching_interests_are_not_capped() {
    let mut user = create_test_user(&[], &["AI", "AI Ethics"], None, false);
    user.user.university = None;
    let internship = create_test_internship(&["Haskell"], &["AI"], "", false);

    let result = score(&user, &internship);

    // No skill points, 2/1 * 25 interest points
    assert_eq!(result.score, 50);
    assert!(result
        .reasons
        .contains(&"Your interests align with 2 of the internship's focus areas".to_string()));
}
