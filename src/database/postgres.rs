use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::gateway::{CvStore, ScanStore, UserStore};
use crate::error::{Error, Result};
use crate::models::cv::{CvContent, CvPatch, CvRecord, Education, Experience, PersonalInfo, Skill};
use crate::models::scan::ScanRecord;
use crate::models::score::CvScore;
use crate::models::user::{NewUser, ProfileUpdate, SubscriptionStatus, UserAccount};

#[derive(Debug, FromRow)]
struct CvRow {
    id: Uuid,
    user_id: Uuid,
    template_id: String,
    title: String,
    personal_info: Json<PersonalInfo>,
    summary: String,
    skills: Json<Vec<Skill>>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    last_score: Option<i32>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CvRow> for CvRecord {
    fn from(row: CvRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            template_id: row.template_id,
            title: row.title,
            content: CvContent {
                personal_info: row.personal_info.0,
                summary: row.summary,
                skills: row.skills.0,
                experience: row.experience.0,
                education: row.education.0,
            },
            last_score: row.last_score,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    photo_url: Option<String>,
    subscription_status: String,
    subscription_expiry: Option<DateTime<Utc>>,
    cv_count: i32,
    scans_today: i32,
    scans_day: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        // A stale counter from an earlier day reads as zero.
        let scans_today = match row.scans_day {
            Some(day) if day == Utc::now().date_naive() => row.scans_today,
            _ => 0,
        };
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            subscription_status: SubscriptionStatus::parse(&row.subscription_status)
                .unwrap_or_default(),
            subscription_expiry: row.subscription_expiry,
            cv_count: row.cv_count,
            scans_today,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ScanRow {
    id: Uuid,
    user_id: Uuid,
    cv_id: Option<Uuid>,
    original_text: String,
    score: Json<CvScore>,
    created_at: DateTime<Utc>,
}

impl From<ScanRow> for ScanRecord {
    fn from(row: ScanRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            cv_id: row.cv_id,
            original_text: row.original_text,
            score: row.score.0,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, display_name, photo_url, subscription_status, \
    subscription_expiry, cv_count, scans_today, scans_day, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgStore {
    async fn create(
        &self,
        owner_id: Uuid,
        template_id: &str,
        content: &CvContent,
    ) -> Result<CvRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CvRow>(
            r#"
            INSERT INTO cvs (
                id, user_id, template_id, title, personal_info, summary, skills, experience, education
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(template_id)
        .bind(content.title())
        .bind(Json(&content.personal_info))
        .bind(&content.summary)
        .bind(Json(&content.skills))
        .bind(Json(&content.experience))
        .bind(Json(&content.education))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET cv_count = cv_count + 1 WHERE id = $1")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, patch: CvPatch) -> Result<CvRecord> {
        let content = patch.content.as_ref();
        let row = sqlx::query_as::<_, CvRow>(
            r#"
            UPDATE cvs SET
                template_id = COALESCE($2, template_id),
                title = COALESCE($3, title),
                personal_info = COALESCE($4, personal_info),
                summary = COALESCE($5, summary),
                skills = COALESCE($6, skills),
                experience = COALESCE($7, experience),
                education = COALESCE($8, education),
                last_score = COALESCE($9, last_score),
                image_url = COALESCE($10, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.template_id.as_deref())
        .bind(content.map(|c| c.title()))
        .bind(content.map(|c| Json(&c.personal_info)))
        .bind(content.map(|c| c.summary.as_str()))
        .bind(content.map(|c| Json(&c.skills)))
        .bind(content.map(|c| Json(&c.experience)))
        .bind(content.map(|c| Json(&c.education)))
        .bind(patch.last_score)
        .bind(patch.image_url.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("CV {} not found", id)))?;

        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CvRecord>> {
        let row = sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<CvRecord>> {
        let rows = sqlx::query_as::<_, CvRow>(
            "SELECT * FROM cvs WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> Result<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, display_name, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                Error::Conflict("Email is already registered".to_string())
            }
            _ => Error::from(e),
        })?;
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<(UserAccount, String)>> {
        #[derive(FromRow)]
        struct WithHash {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, WithHash>(&format!(
            "SELECT {}, password_hash FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET display_name = COALESCE($2, display_name), \
             photo_url = COALESCE($3, photo_url) WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.display_name)
        .bind(update.photo_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET subscription_status = $2, subscription_expiry = $3 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(expiry)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn record_scan(&self, id: Uuid) -> Result<UserAccount> {
        let today = Utc::now().date_naive();
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                scans_today = CASE WHEN scans_day = $2 THEN scans_today + 1 ELSE 1 END, \
                scans_day = $2 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl ScanStore for PgStore {
    async fn insert(
        &self,
        owner_id: Uuid,
        cv_id: Option<Uuid>,
        original_text: &str,
        score: &CvScore,
    ) -> Result<ScanRecord> {
        let row = sqlx::query_as::<_, ScanRow>(
            r#"
            INSERT INTO scans (id, user_id, cv_id, original_text, score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(cv_id)
        .bind(original_text)
        .bind(Json(score))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRow>(
            "SELECT * FROM scans WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
