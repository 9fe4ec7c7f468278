// Integration tests for InternMatch

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use async_trait::async_trait;
use chrono::Utc;
use intern_match::core::{MatchError, Matcher, Recommender};
use intern_match::errors::{handle_json_payload_error, AppError};
use intern_match::models::{
    Company, Interest, Internship, InternshipDetail, InternshipSkill, LoginRequest, Skill, SkillLevel, User,
    UserProfile, UserSkill,
};
use intern_match::routes::AuthUser;
use intern_match::services::{JwtManager, MatchStore, StoreError};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

/// In-memory store. Ids listed in `broken` fail with a store error.
#[derive(Default)]
struct InMemoryStore {
    users: HashMap<Uuid, UserProfile>,
    internships: Vec<InternshipDetail>,
    broken: Vec<Uuid>,
    dangling: Vec<Uuid>,
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn fetch_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn fetch_internship(&self, internship_id: Uuid) -> Result<Option<InternshipDetail>, StoreError> {
        if self.broken.contains(&internship_id) {
            return Err(StoreError::SqlxError(sqlx::Error::PoolTimedOut));
        }
        Ok(self.internships.iter().find(|i| i.id() == internship_id).cloned())
    }

    async fn active_internship_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids: Vec<Uuid> = self
            .internships
            .iter()
            .filter(|i| i.internship.active)
            .map(|i| i.id())
            .collect();
        ids.extend(self.broken.iter().copied());
        ids.extend(self.dangling.iter().copied());
        Ok(ids)
    }
}

fn named(name: &str) -> (Uuid, String) {
    (Uuid::new_v4(), name.to_string())
}

fn create_test_user(skills: &[&str], interests: &[&str], location: &str) -> UserProfile {
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
            location: Some(location.to_string()),
            bio: None,
            age: Some(21),
            profile_complete: true,
            created_at: now,
            updated_at: now,
        },
        skills: skills
            .iter()
            .map(|s| {
                let (id, name) = named(s);
                UserSkill {
                    skill: Skill { id, name, description: None },
                    level: SkillLevel::Advanced,
                }
            })
            .collect(),
        interests: interests
            .iter()
            .map(|i| {
                let (id, name) = named(i);
                Interest { id, name, description: None }
            })
            .collect(),
    }
}

fn create_test_internship(title: &str, skills: &[&str], location: &str, active: bool) -> InternshipDetail {
    let now = Utc::now();
    let company_id = Uuid::new_v4();
    InternshipDetail {
        internship: Internship {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} internship description", title),
            company_id,
            location: location.to_string(),
            duration: "6 months".to_string(),
            salary: Some("$2000/month".to_string()),
            requirements: Json(vec![]),
            team_size: None,
            rating: 4.0,
            applicants: 0,
            posted_date: now,
            deadline: None,
            remote: false,
            active,
            created_at: now,
            updated_at: now,
        },
        company: Company {
            id: company_id,
            name: format!("{} Corp", title),
            description: None,
            website: None,
            logo: None,
            location: None,
            size: None,
            industry: None,
        },
        skills: skills
            .iter()
            .map(|s| {
                let (id, name) = named(s);
                InternshipSkill {
                    skill: Skill { id, name, description: None },
                    required: true,
                }
            })
            .collect(),
        interests: vec![],
        application_count: 0,
        saved_count: 0,
    }
}

fn recommender(store: InMemoryStore) -> Recommender<InMemoryStore> {
    Recommender::new(Arc::new(store), Matcher::with_default_weights(), 4)
}

#[tokio::test]
async fn test_top_recommendations_sorted_and_limited() {
    let user = create_test_user(&["Rust", "SQL"], &[], "Berlin");
    let user_id = user.user.id;

    let mut store = InMemoryStore::default();
    store.users.insert(user_id, user);
    store.internships = vec![
        create_test_internship("Frontend", &["CSS", "Vue"], "Madrid", true),
        create_test_internship("Backend", &["Rust", "SQL"], "Berlin", true),
        create_test_internship("Data", &["SQL", "Spark"], "Berlin", true),
        create_test_internship("Closed", &["Rust", "SQL"], "Berlin", false),
    ];
    let backend_id = store.internships[1].id();
    let closed_id = store.internships[3].id();

    let results = recommender(store).top_recommendations(user_id, 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].internship_id, backend_id);
    assert!(results[0].score >= results[1].score);
    assert!(results.iter().all(|r| r.internship_id != closed_id));
}

#[tokio::test]
async fn test_failed_items_become_placeholders() {
    let user = create_test_user(&["Rust"], &[], "Berlin");
    let user_id = user.user.id;
    let broken = Uuid::new_v4();
    let dangling = Uuid::new_v4();

    let mut store = InMemoryStore::default();
    store.users.insert(user_id, user);
    store.internships = vec![create_test_internship("Backend", &["Rust"], "Berlin", true)];
    store.broken = vec![broken];
    store.dangling = vec![dangling];

    let results = recommender(store).top_recommendations(user_id, 10).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].score > 0);
    for placeholder in &results[1..] {
        assert_eq!(placeholder.score, 0);
        assert_eq!(placeholder.reasons, vec!["Unable to calculate match score".to_string()]);
    }
    // Equal placeholder scores keep fetch order
    assert_eq!(results[1].internship_id, broken);
    assert_eq!(results[2].internship_id, dangling);
}

#[tokio::test]
async fn test_missing_user_is_propagated() {
    let mut store = InMemoryStore::default();
    store.internships = vec![create_test_internship("Backend", &["Rust"], "Berlin", true)];
    let internship_id = store.internships[0].id();
    let recommender = recommender(store);
    let ghost = Uuid::new_v4();

    let bulk = recommender.top_recommendations(ghost, 5).await;
    assert!(matches!(bulk, Err(MatchError::UserNotFound(id)) if id == ghost));

    let single = recommender.match_score(ghost, internship_id).await;
    assert!(matches!(single, Err(MatchError::UserNotFound(_))));
}

#[tokio::test]
async fn test_match_score_for_unknown_internship() {
    let user = create_test_user(&["Rust"], &[], "Berlin");
    let user_id = user.user.id;
    let mut store = InMemoryStore::default();
    store.users.insert(user_id, user);

    let missing = Uuid::new_v4();
    let result = recommender(store).match_score(user_id, missing).await;

    assert!(matches!(result, Err(MatchError::InternshipNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_rank_for_user_pairs_scores_with_internships() {
    let user = create_test_user(&["Python"], &["AI"], "Remote");
    let user_id = user.user.id;
    let mut store = InMemoryStore::default();
    store.users.insert(user_id, user);

    let candidates = vec![
        create_test_internship("Web", &["PHP"], "Paris", true),
        create_test_internship("ML", &["Python"], "Paris", true),
        create_test_internship("Ops", &["Bash"], "Paris", true),
    ];
    let ml_id = candidates[1].id();

    let ranked = recommender(store).rank_for_user(user_id, candidates, 2).await.unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].0.id(), ml_id);
    assert_eq!(ranked[0].1.internship_id, ml_id);
}

#[tokio::test]
async fn test_empty_catalogue_yields_empty_list() {
    let user = create_test_user(&[], &[], "Berlin");
    let user_id = user.user.id;
    let mut store = InMemoryStore::default();
    store.users.insert(user_id, user);

    let results = recommender(store).top_recommendations(user_id, 5).await.unwrap();

    assert!(results.is_empty());
}

async fn whoami(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "userId": user.user_id }))
}

async fn login_echo(req: web::Json<LoginRequest>) -> Result<HttpResponse, AppError> {
    req.validate()?;
    Ok(HttpResponse::Ok().finish())
}

#[actix_web::test]
async fn test_bearer_auth_on_protected_route() {
    let jwt = web::Data::new(JwtManager::new("integration-secret", 1));
    let user_id = Uuid::new_v4();
    let token = jwt.generate_token(user_id, "sam@example.com").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(jwt.clone())
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userId"], user_id.to_string());

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Access token required");
}

#[actix_web::test]
async fn test_validation_and_malformed_json_errors() {
    let app = test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .route("/login", web::post().to(login_echo)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(serde_json::json!({ "email": "nope", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"].as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::post()
        .uri("/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap_or_default().starts_with("Invalid JSON"));
}
