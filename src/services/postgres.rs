use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::models::requests::normalize_email;
use crate::models::responses::{ApplicationStats, StatusBreakdown};
use crate::models::{
    Application, ApplicationDetail, ApplicationStatus, Company, CreateApplicationRequest, CreateInternshipRequest,
    Interest, Internship, InternshipDetail, InternshipListQuery, InternshipSkill, Skill, SkillLevel,
    UpdateApplicationRequest, UpdateInternshipRequest, UpdateProfileRequest, User, UserProfile, UserSkill,
};
use crate::services::store::{MatchStore, StoreError};

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, university, major, graduation_year, \
    location, bio, age, profile_complete, created_at, updated_at";

const INTERNSHIP_COLUMNS: &str = "i.id, i.title, i.description, i.company_id, i.location, i.duration, i.salary, \
    i.requirements, i.team_size, i.rating, i.applicants, i.posted_date, i.deadline, i.remote, i.active, \
    i.created_at, i.updated_at";

const APPLICATION_COLUMNS: &str =
    "id, user_id, internship_id, status, applied_at, notes, resume_url, cover_letter";

/// New user row prepared by the signup handler
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
}

/// PostgreSQL client owning every query the service issues
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &crate::config::DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, phone)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(new_user.email))
            .bind(new_user.password_hash)
            .bind(new_user.first_name.trim())
            .bind(new_user.last_name.trim())
            .bind(new_user.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "User with this email already exists"))?;

        tracing::debug!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// User and stored password hash for a login attempt
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, StoreError> {
        let query = format!("SELECT {}, password_hash FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let hash: String = row.try_get("password_hash")?;
                let user = User::from_row(&row)?;
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool, StoreError> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
                .bind(normalize_email(email))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    /// Apply a partial profile update. Absent fields keep their value.
    pub async fn update_user(&self, user_id: Uuid, update: &UpdateProfileRequest) -> Result<Option<User>, StoreError> {
        let query = format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                university = COALESCE($6, university),
                major = COALESCE($7, major),
                graduation_year = COALESCE($8, graduation_year),
                location = COALESCE($9, location),
                bio = COALESCE($10, bio),
                age = COALESCE($11, age),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(update.first_name.as_deref().map(str::trim))
            .bind(update.last_name.as_deref().map(str::trim))
            .bind(update.email.as_deref().map(normalize_email))
            .bind(update.phone.as_deref())
            .bind(update.university.as_deref())
            .bind(update.major.as_deref())
            .bind(update.graduation_year.as_deref())
            .bind(update.location.as_deref())
            .bind(update.bio.as_deref())
            .bind(update.age)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Email is already taken"))?;

        Ok(user)
    }

    pub async fn mark_profile_complete(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET profile_complete = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        let skills = self.user_skills(user_id).await?;
        let interests = self.user_interests(user_id).await?;

        Ok(Some(UserProfile { user, skills, interests }))
    }

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.name, s.description, us.level
            FROM user_skills us
            JOIN skills s ON s.id = us.skill_id
            WHERE us.user_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(UserSkill {
                    skill: skill_from_row(row)?,
                    level: row.try_get("level")?,
                })
            })
            .collect()
    }

    async fn user_interests(&self, user_id: Uuid) -> Result<Vec<Interest>, StoreError> {
        Ok(sqlx::query_as::<_, Interest>(
            r#"
            SELECT i.id, i.name, i.description
            FROM user_interests ui
            JOIN interests i ON i.id = ui.interest_id
            WHERE ui.user_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ---------------------------------------------------------------------
    // Skill and interest catalogue
    // ---------------------------------------------------------------------

    pub async fn get_skill(&self, skill_id: Uuid) -> Result<Option<Skill>, StoreError> {
        Ok(sqlx::query_as::<_, Skill>("SELECT id, name, description FROM skills WHERE id = $1")
            .bind(skill_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        Ok(sqlx::query_as::<_, Skill>("SELECT id, name, description FROM skills ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_interest(&self, interest_id: Uuid) -> Result<Option<Interest>, StoreError> {
        Ok(sqlx::query_as::<_, Interest>("SELECT id, name, description FROM interests WHERE id = $1")
            .bind(interest_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_interests(&self) -> Result<Vec<Interest>, StoreError> {
        Ok(sqlx::query_as::<_, Interest>("SELECT id, name, description FROM interests ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?)
    }

    /// Attach a skill to a user. Fails with `Conflict` if already attached.
    pub async fn add_user_skill(&self, user_id: Uuid, skill: Skill, level: SkillLevel) -> Result<UserSkill, StoreError> {
        sqlx::query("INSERT INTO user_skills (user_id, skill_id, level) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(skill.id)
            .bind(level)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Skill already added to profile"))?;

        Ok(UserSkill { skill, level })
    }

    pub async fn remove_user_skill(&self, user_id: Uuid, skill_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_skills WHERE user_id = $1 AND skill_id = $2")
            .bind(user_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_user_interest(&self, user_id: Uuid, interest: Interest) -> Result<Interest, StoreError> {
        sqlx::query("INSERT INTO user_interests (user_id, interest_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(interest.id)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Interest already added to profile"))?;

        Ok(interest)
    }

    pub async fn remove_user_interest(&self, user_id: Uuid, interest_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_interests WHERE user_id = $1 AND interest_id = $2")
            .bind(user_id)
            .bind(interest_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---------------------------------------------------------------------
    // Internships
    // ---------------------------------------------------------------------

    pub async fn get_company(&self, company_id: Uuid) -> Result<Option<Company>, StoreError> {
        Ok(sqlx::query_as::<_, Company>(
            "SELECT id, name, description, website, logo, location, size, industry FROM companies WHERE id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// One page of active internships matching the query filters, plus the
    /// total number of matches
    pub async fn list_internships(
        &self,
        filters: &InternshipListQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InternshipDetail>, i64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM internships i JOIN companies c ON c.id = i.company_id",
        );
        push_internship_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM internships i JOIN companies c ON c.id = i.company_id",
            INTERNSHIP_COLUMNS
        ));
        push_internship_filters(&mut page, filters);
        page.push(" ORDER BY i.posted_date DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = page.build_query_as::<Internship>().fetch_all(&self.pool).await?;
        let details = self.hydrate(rows).await?;

        Ok((details, total))
    }

    pub async fn get_internship(&self, internship_id: Uuid) -> Result<Option<InternshipDetail>, StoreError> {
        let query = format!("SELECT {} FROM internships i WHERE i.id = $1", INTERNSHIP_COLUMNS);
        let row = sqlx::query_as::<_, Internship>(&query)
            .bind(internship_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(internship) => Ok(self.hydrate(vec![internship]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Insert an internship with its skill and interest links in one transaction
    pub async fn create_internship(&self, req: &CreateInternshipRequest) -> Result<InternshipDetail, StoreError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO internships (
                id, title, description, company_id, location, duration,
                salary, requirements, team_size, deadline, remote
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(req.title.trim())
        .bind(req.description.trim())
        .bind(req.company_id)
        .bind(req.location.trim())
        .bind(req.duration.trim())
        .bind(req.salary.as_deref())
        .bind(Json(&req.requirements))
        .bind(req.team_size.as_deref())
        .bind(req.deadline)
        .bind(req.remote)
        .execute(&mut *tx)
        .await?;

        for skill_id in &req.skill_ids {
            sqlx::query(
                "INSERT INTO internship_skills (internship_id, skill_id, required) VALUES ($1, $2, TRUE)
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(skill_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| invalid_on_foreign_key(e, "Unknown skill id"))?;
        }

        for interest_id in &req.interest_ids {
            sqlx::query(
                "INSERT INTO internship_interests (internship_id, interest_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(interest_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| invalid_on_foreign_key(e, "Unknown interest id"))?;
        }

        tx.commit().await?;

        tracing::info!("Created internship {} ({})", id, req.title);

        self.get_internship(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Internship {}", id)))
    }

    pub async fn update_internship(
        &self,
        internship_id: Uuid,
        update: &UpdateInternshipRequest,
    ) -> Result<Option<InternshipDetail>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE internships SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                duration = COALESCE($5, duration),
                salary = COALESCE($6, salary),
                requirements = COALESCE($7, requirements),
                team_size = COALESCE($8, team_size),
                deadline = COALESCE($9, deadline),
                remote = COALESCE($10, remote),
                active = COALESCE($11, active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(internship_id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.location.as_deref())
        .bind(update.duration.as_deref())
        .bind(update.salary.as_deref())
        .bind(update.requirements.as_ref().map(Json))
        .bind(update.team_size.as_deref())
        .bind(update.deadline)
        .bind(update.remote)
        .bind(update.active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_internship(internship_id).await
    }

    /// Soft delete: flips `active` off, returns false for an unknown id
    pub async fn deactivate_internship(&self, internship_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE internships SET active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(internship_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bookmark or un-bookmark. Returns the new saved state.
    pub async fn toggle_saved(&self, user_id: Uuid, internship_id: Uuid) -> Result<bool, StoreError> {
        let removed = sqlx::query("DELETE FROM saved_internships WHERE user_id = $1 AND internship_id = $2")
            .bind(user_id)
            .bind(internship_id)
            .execute(&self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO saved_internships (user_id, internship_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(internship_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn is_saved(&self, user_id: Uuid, internship_id: Uuid) -> Result<bool, StoreError> {
        let saved: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM saved_internships WHERE user_id = $1 AND internship_id = $2)",
        )
        .bind(user_id)
        .bind(internship_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn has_applied(&self, user_id: Uuid, internship_id: Uuid) -> Result<bool, StoreError> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE user_id = $1 AND internship_id = $2)",
        )
        .bind(user_id)
        .bind(internship_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }

    /// Bookmarked internships with the time they were saved, newest first
    pub async fn saved_internships(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(InternshipDetail, DateTime<Utc>)>, StoreError> {
        let query = format!(
            "SELECT {}, s.saved_at FROM saved_internships s
             JOIN internships i ON i.id = s.internship_id
             WHERE s.user_id = $1
             ORDER BY s.saved_at DESC",
            INTERNSHIP_COLUMNS
        );
        let rows = sqlx::query(&query).bind(user_id).fetch_all(&self.pool).await?;

        let mut saved_at = HashMap::with_capacity(rows.len());
        let mut internships = Vec::with_capacity(rows.len());
        for row in &rows {
            let internship = Internship::from_row(row)?;
            saved_at.insert(internship.id, row.try_get::<DateTime<Utc>, _>("saved_at")?);
            internships.push(internship);
        }

        let details = self.hydrate(internships).await?;
        Ok(details
            .into_iter()
            .filter_map(|d| saved_at.get(&d.id()).map(|at| (d, *at)))
            .collect())
    }

    /// Active internships tagged with a skill or interest whose name contains
    /// `category` (case-insensitive)
    pub async fn internships_by_category(&self, category: &str, take: i64) -> Result<Vec<InternshipDetail>, StoreError> {
        let query = format!(
            r#"
            SELECT {} FROM internships i
            WHERE i.active = TRUE AND (
                EXISTS (
                    SELECT 1 FROM internship_interests ii
                    JOIN interests t ON t.id = ii.interest_id
                    WHERE ii.internship_id = i.id AND t.name ILIKE $1
                )
                OR EXISTS (
                    SELECT 1 FROM internship_skills isk
                    JOIN skills s ON s.id = isk.skill_id
                    WHERE isk.internship_id = i.id AND s.name ILIKE $1
                )
            )
            ORDER BY i.posted_date DESC
            LIMIT $2
            "#,
            INTERNSHIP_COLUMNS
        );

        let rows = sqlx::query_as::<_, Internship>(&query)
            .bind(like_pattern(category))
            .bind(take)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Active internships posted since `since`, most applied-to first
    pub async fn trending_internships(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<InternshipDetail>, StoreError> {
        let query = format!(
            r#"
            SELECT {} FROM internships i
            LEFT JOIN applications a ON a.internship_id = i.id
            WHERE i.active = TRUE AND i.posted_date >= $1
            GROUP BY i.id
            ORDER BY COUNT(a.id) DESC, i.posted_date DESC
            LIMIT $2
            "#,
            INTERNSHIP_COLUMNS
        );

        let rows = sqlx::query_as::<_, Internship>(&query)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    /// Active internships sharing a skill or interest with the reference.
    /// `None` when the reference internship does not exist.
    pub async fn similar_internships(
        &self,
        internship_id: Uuid,
        limit: i64,
    ) -> Result<Option<Vec<InternshipDetail>>, StoreError> {
        let Some(reference) = self.get_internship(internship_id).await? else {
            return Ok(None);
        };

        let skill_ids: Vec<Uuid> = reference.skills.iter().map(|s| s.skill.id).collect();
        let interest_ids: Vec<Uuid> = reference.interests.iter().map(|i| i.id).collect();

        let query = format!(
            r#"
            SELECT {} FROM internships i
            WHERE i.active = TRUE AND i.id <> $1 AND (
                EXISTS (SELECT 1 FROM internship_skills isk WHERE isk.internship_id = i.id AND isk.skill_id = ANY($2))
                OR EXISTS (SELECT 1 FROM internship_interests ii WHERE ii.internship_id = i.id AND ii.interest_id = ANY($3))
            )
            ORDER BY i.posted_date DESC
            LIMIT $4
            "#,
            INTERNSHIP_COLUMNS
        );

        let rows = sqlx::query_as::<_, Internship>(&query)
            .bind(internship_id)
            .bind(&skill_ids)
            .bind(&interest_ids)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(self.hydrate(rows).await?))
    }

    /// Attach company, skills, interests and counters to internship rows,
    /// preserving row order
    async fn hydrate(&self, internships: Vec<Internship>) -> Result<Vec<InternshipDetail>, StoreError> {
        if internships.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = internships.iter().map(|i| i.id).collect();
        let company_ids: Vec<Uuid> = internships.iter().map(|i| i.company_id).collect();

        let companies: HashMap<Uuid, Company> = sqlx::query_as::<_, Company>(
            "SELECT id, name, description, website, logo, location, size, industry FROM companies WHERE id = ANY($1)",
        )
        .bind(&company_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

        let mut skills: HashMap<Uuid, Vec<InternshipSkill>> = HashMap::new();
        let skill_rows = sqlx::query(
            r#"
            SELECT isk.internship_id, s.id, s.name, s.description, isk.required
            FROM internship_skills isk
            JOIN skills s ON s.id = isk.skill_id
            WHERE isk.internship_id = ANY($1)
            ORDER BY s.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in &skill_rows {
            let owner: Uuid = row.try_get("internship_id")?;
            skills.entry(owner).or_default().push(InternshipSkill {
                skill: skill_from_row(row)?,
                required: row.try_get("required")?,
            });
        }

        let mut interests: HashMap<Uuid, Vec<Interest>> = HashMap::new();
        let interest_rows = sqlx::query(
            r#"
            SELECT ii.internship_id, t.id, t.name, t.description
            FROM internship_interests ii
            JOIN interests t ON t.id = ii.interest_id
            WHERE ii.internship_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in &interest_rows {
            let owner: Uuid = row.try_get("internship_id")?;
            interests.entry(owner).or_default().push(Interest {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
            });
        }

        let mut counts: HashMap<Uuid, (i64, i64)> = HashMap::new();
        let count_rows = sqlx::query(
            r#"
            SELECT i.id,
                (SELECT COUNT(*) FROM applications a WHERE a.internship_id = i.id) AS application_count,
                (SELECT COUNT(*) FROM saved_internships s WHERE s.internship_id = i.id) AS saved_count
            FROM internships i
            WHERE i.id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in &count_rows {
            counts.insert(
                row.try_get("id")?,
                (row.try_get("application_count")?, row.try_get("saved_count")?),
            );
        }

        let details = internships
            .into_iter()
            .filter_map(|internship| {
                let id = internship.id;
                let company = match companies.get(&internship.company_id) {
                    Some(c) => c.clone(),
                    None => {
                        tracing::warn!("Internship {} references missing company {}", id, internship.company_id);
                        return None;
                    }
                };
                let (application_count, saved_count) = counts.get(&id).copied().unwrap_or((0, 0));
                Some(InternshipDetail {
                    internship,
                    company,
                    skills: skills.remove(&id).unwrap_or_default(),
                    interests: interests.remove(&id).unwrap_or_default(),
                    application_count,
                    saved_count,
                })
            })
            .collect();

        Ok(details)
    }

    // ---------------------------------------------------------------------
    // Applications
    // ---------------------------------------------------------------------

    pub async fn list_applications(
        &self,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ApplicationDetail>, i64), StoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE user_id = $1 AND ($2::application_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {} FROM applications
             WHERE user_id = $1 AND ($2::application_status IS NULL OR status = $2)
             ORDER BY applied_at DESC
             LIMIT $3 OFFSET $4",
            APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((self.attach_internships(applications).await?, total))
    }

    /// Insert an application and bump the internship's applicant counter
    /// atomically
    pub async fn create_application(
        &self,
        user_id: Uuid,
        req: &CreateApplicationRequest,
    ) -> Result<ApplicationDetail, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO applications (id, user_id, internship_id, status, notes, cover_letter, resume_url)
             VALUES ($1, $2, $3, 'pending', $4, $5, $6)
             RETURNING {}",
            APPLICATION_COLUMNS
        );
        let application = sqlx::query_as::<_, Application>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(req.internship_id)
            .bind(req.notes.as_deref())
            .bind(req.cover_letter.as_deref())
            .bind(req.resume_url.as_deref())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "You have already applied for this internship"))?;

        sqlx::query("UPDATE internships SET applicants = applicants + 1 WHERE id = $1")
            .bind(req.internship_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("User {} applied to internship {}", user_id, req.internship_id);

        self.attach_internships(vec![application])
            .await?
            .pop()
            .ok_or_else(|| StoreError::NotFound(format!("Internship {}", req.internship_id)))
    }

    /// Application owned by `user_id`; other users' applications are invisible
    pub async fn get_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Option<ApplicationDetail>, StoreError> {
        let query = format!(
            "SELECT {} FROM applications WHERE id = $1 AND user_id = $2",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Application>(&query)
            .bind(application_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(application) => Ok(self.attach_internships(vec![application]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn update_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        update: &UpdateApplicationRequest,
    ) -> Result<Option<ApplicationDetail>, StoreError> {
        let query = format!(
            "UPDATE applications SET
                status = COALESCE($3, status),
                notes = COALESCE($4, notes),
                cover_letter = COALESCE($5, cover_letter)
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Application>(&query)
            .bind(application_id)
            .bind(user_id)
            .bind(update.status)
            .bind(update.notes.as_deref())
            .bind(update.cover_letter.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(application) => Ok(self.attach_internships(vec![application]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Delete an application and decrement the applicant counter atomically.
    /// Returns false when the user owns no such application.
    pub async fn withdraw_application(&self, user_id: Uuid, application_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let internship_id: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM applications WHERE id = $1 AND user_id = $2 RETURNING internship_id",
        )
        .bind(application_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(internship_id) = internship_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE internships SET applicants = GREATEST(applicants - 1, 0) WHERE id = $1")
            .bind(internship_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("User {} withdrew application {}", user_id, application_id);
        Ok(true)
    }

    pub async fn application_stats(&self, user_id: Uuid) -> Result<ApplicationStats, StoreError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut breakdown = StatusBreakdown::default();
        for row in &rows {
            let status: ApplicationStatus = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            match status {
                ApplicationStatus::Pending => breakdown.pending = count,
                ApplicationStatus::Accepted => breakdown.accepted = count,
                ApplicationStatus::Rejected => breakdown.rejected = count,
                ApplicationStatus::Withdrawn => breakdown.withdrawn = count,
            }
        }

        Ok(ApplicationStats {
            total_applications: breakdown.pending + breakdown.accepted + breakdown.rejected + breakdown.withdrawn,
            status_breakdown: breakdown,
        })
    }

    async fn attach_internships(&self, applications: Vec<Application>) -> Result<Vec<ApplicationDetail>, StoreError> {
        if applications.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = applications.iter().map(|a| a.internship_id).collect();
        let query = format!("SELECT {} FROM internships i WHERE i.id = ANY($1)", INTERNSHIP_COLUMNS);
        let rows = sqlx::query_as::<_, Internship>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_id: HashMap<Uuid, InternshipDetail> =
            self.hydrate(rows).await?.into_iter().map(|d| (d.id(), d)).collect();

        // A user applies to an internship at most once
        Ok(applications
            .into_iter()
            .filter_map(|application| {
                let internship = by_id.remove(&application.internship_id)?;
                Some(ApplicationDetail { application, internship })
            })
            .collect())
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn fetch_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.get_user_profile(user_id).await
    }

    async fn fetch_internship(&self, internship_id: Uuid) -> Result<Option<InternshipDetail>, StoreError> {
        self.get_internship(internship_id).await
    }

    async fn active_internship_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(sqlx::query_scalar("SELECT id FROM internships WHERE active = TRUE ORDER BY posted_date DESC")
            .fetch_all(&self.pool)
            .await?)
    }
}

/// Append the `GET /internships` filters to a query over `internships i`
/// joined with `companies c`
fn push_internship_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &InternshipListQuery) {
    builder.push(" WHERE i.active = TRUE");

    if let Some(location) = non_empty(&filters.location) {
        builder.push(" AND i.location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(remote) = filters.remote {
        builder.push(" AND i.remote = ").push_bind(remote);
    }
    if let Some(company) = non_empty(&filters.company) {
        builder.push(" AND c.name ILIKE ").push_bind(like_pattern(company));
    }
    if let Some(search) = non_empty(&filters.search) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (i.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let skills: Vec<String> = filters.skill_list().iter().map(|s| s.to_lowercase()).collect();
    if !skills.is_empty() {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM internship_skills isk JOIN skills s ON s.id = isk.skill_id \
                 WHERE isk.internship_id = i.id AND LOWER(s.name) = ANY(",
            )
            .push_bind(skills)
            .push("))");
    }

    let interests: Vec<String> = filters.interest_list().iter().map(|s| s.to_lowercase()).collect();
    if !interests.is_empty() {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM internship_interests ii JOIN interests t ON t.id = ii.interest_id \
                 WHERE ii.internship_id = i.id AND LOWER(t.name) = ANY(",
            )
            .push_bind(interests)
            .push("))");
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn skill_from_row(row: &PgRow) -> Result<Skill, sqlx::Error> {
    Ok(Skill {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message.to_string()),
        _ => StoreError::from(err),
    }
}

fn invalid_on_foreign_key(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::InvalidInput(message.to_string()),
        _ => StoreError::from(err),
    }
}
