//! Persistent profile storage
//!
//! Profiles are keyed by a natural key (see [`crate::key`]). Writing the same
//! key twice overwrites every mutable column with the newer values and bumps
//! `updated_at`; nothing is merged and no second row is created.

use crate::config::DatabaseConfig;
use crate::error::{IngestError, IngestResult};
use crate::models::{StoredProfile, ValidatedPerson};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Whether an upsert created a row or replaced one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Keyed profile persistence
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert the profile under `key`, or overwrite the existing one
    async fn upsert(&self, key: &str, person: &ValidatedPerson) -> IngestResult<UpsertOutcome>;

    /// Number of stored profiles
    async fn count(&self) -> IngestResult<i64>;
}

const UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (
    email, name, location, linkedin_profile_url, linkedin_profile_urn,
    default_position_title, default_position_company_linkedin_id,
    default_position_is_decision_maker, flagship_profile_url, profile_picture_url,
    headline, summary, num_of_connections, related_colleague_company_id,
    skills, employer, education_background, emails, websites, twitter_handle,
    languages, pronoun, query_person_linkedin_urn, linkedin_slug_or_urns, current_title
)
VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
)
ON CONFLICT (email) DO UPDATE SET
    name = EXCLUDED.name,
    location = EXCLUDED.location,
    linkedin_profile_url = EXCLUDED.linkedin_profile_url,
    linkedin_profile_urn = EXCLUDED.linkedin_profile_urn,
    default_position_title = EXCLUDED.default_position_title,
    default_position_company_linkedin_id = EXCLUDED.default_position_company_linkedin_id,
    default_position_is_decision_maker = EXCLUDED.default_position_is_decision_maker,
    flagship_profile_url = EXCLUDED.flagship_profile_url,
    profile_picture_url = EXCLUDED.profile_picture_url,
    headline = EXCLUDED.headline,
    summary = EXCLUDED.summary,
    num_of_connections = EXCLUDED.num_of_connections,
    related_colleague_company_id = EXCLUDED.related_colleague_company_id,
    skills = EXCLUDED.skills,
    employer = EXCLUDED.employer,
    education_background = EXCLUDED.education_background,
    emails = EXCLUDED.emails,
    websites = EXCLUDED.websites,
    twitter_handle = EXCLUDED.twitter_handle,
    languages = EXCLUDED.languages,
    pronoun = EXCLUDED.pronoun,
    query_person_linkedin_urn = EXCLUDED.query_person_linkedin_urn,
    linkedin_slug_or_urns = EXCLUDED.linkedin_slug_or_urns,
    current_title = EXCLUDED.current_title,
    updated_at = NOW()
RETURNING (xmax = 0) AS inserted
"#;

/// PostgreSQL-backed profile store
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `config`
    pub async fn connect(config: &DatabaseConfig) -> IngestResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "Database connection pool created"
        );

        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> IngestResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn upsert(&self, key: &str, person: &ValidatedPerson) -> IngestResult<UpsertOutcome> {
        let inserted: bool = sqlx::query_scalar(UPSERT_PROFILE)
            .bind(key)
            .bind(&person.name)
            .bind(&person.location)
            .bind(&person.linkedin_profile_url)
            .bind(&person.linkedin_profile_urn)
            .bind(&person.default_position_title)
            .bind(&person.default_position_company_linkedin_id)
            .bind(person.default_position_is_decision_maker)
            .bind(&person.flagship_profile_url)
            .bind(&person.profile_picture_url)
            .bind(&person.headline)
            .bind(&person.summary)
            .bind(person.num_of_connections)
            .bind(person.related_colleague_company_id)
            .bind(person.skills.as_ref().map(Json))
            .bind(person.employer.as_ref().map(Json))
            .bind(person.education_background.as_ref().map(Json))
            .bind(person.emails.as_ref().map(Json))
            .bind(person.websites.as_ref().map(Json))
            .bind(&person.twitter_handle)
            .bind(person.languages.as_ref().map(Json))
            .bind(&person.pronoun)
            .bind(&person.query_person_linkedin_urn)
            .bind(person.linkedin_slug_or_urns.as_ref().map(Json))
            .bind(&person.current_title)
            .fetch_one(&self.pool)
            .await?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn count(&self) -> IngestResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// In-process profile store with the same overwrite semantics
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<String, StoredProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the profile stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredProfile> {
        self.rows.lock().ok()?.get(key).cloned()
    }

    /// All stored profiles, sorted by key
    pub fn profiles(&self) -> Vec<StoredProfile> {
        let mut rows: Vec<StoredProfile> = self
            .rows
            .lock()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.email.cmp(&b.email));
        rows
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn upsert(&self, key: &str, person: &ValidatedPerson) -> IngestResult<UpsertOutcome> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::persistence("profile store lock poisoned"))?;
        let now = Utc::now();

        match rows.get_mut(key) {
            Some(existing) => {
                existing.person = person.clone();
                existing.updated_at = now;
                Ok(UpsertOutcome::Updated)
            },
            None => {
                rows.insert(
                    key.to_string(),
                    StoredProfile {
                        email: key.to_string(),
                        person: person.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            },
        }
    }

    async fn count(&self) -> IngestResult<i64> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::persistence("profile store lock poisoned"))?;
        Ok(rows.len() as i64)
    }
}
