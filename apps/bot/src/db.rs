//! PostgreSQL layer: connection pool, session-cookie store, and the
//! write-only application log.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// How long a freshly captured session cookie stays valid.
pub const SESSION_TTL_DAYS: i64 = 365;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the two tables the bot needs if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY,
            account_email TEXT NOT NULL UNIQUE,
            cookie_value TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id UUID PRIMARY KEY,
            job_title TEXT NOT NULL,
            company TEXT NOT NULL,
            job_url TEXT NOT NULL UNIQUE,
            identity TEXT NOT NULL,
            status TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── session store ───────────────────────────────────────────────────────

/// Session cookie value plus its expiry, keyed by account email in the
/// store.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<SessionToken>>;
    async fn save(&self, email: &str, token: &SessionToken) -> Result<()>;
    async fn invalidate(&self, email: &str) -> Result<()>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    cookie_value: String,
    expires_at: DateTime<Utc>,
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, email: &str) -> Result<Option<SessionToken>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT cookie_value, expires_at FROM sessions WHERE account_email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SessionToken {
            value: r.cookie_value,
            expires_at: r.expires_at,
        }))
    }

    async fn save(&self, email: &str, token: &SessionToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, account_email, cookie_value, expires_at, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (account_email) DO UPDATE
                SET cookie_value = EXCLUDED.cookie_value,
                    expires_at = EXCLUDED.expires_at,
                    updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&token.value)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn invalidate(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE account_email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ── application log ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Error,
}

impl ApplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyStatus::Applied => "applied",
            ApplyStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord<'a> {
    pub job_title: &'a str,
    pub company: &'a str,
    pub job_url: &'a str,
    /// Account the application was made under.
    pub identity: &'a str,
    pub status: ApplyStatus,
}

/// Write-only sink the run loop feeds after every attempt. Re-applying to
/// the same URL updates the existing row.
#[async_trait]
pub trait ApplicationLog: Send + Sync {
    async fn record(&self, entry: &ApplicationRecord<'_>) -> Result<()>;
    /// Whether a successful application for `job_url` is already on record.
    async fn has_applied(&self, job_url: &str) -> Result<bool>;
}

pub struct PgApplicationLog {
    pool: PgPool,
}

impl PgApplicationLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationLog for PgApplicationLog {
    async fn record(&self, entry: &ApplicationRecord<'_>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO applications (id, job_title, company, job_url, identity, status, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (job_url) DO UPDATE
                SET status = EXCLUDED.status,
                    applied_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.job_title)
        .bind(entry.company)
        .bind(entry.job_url)
        .bind(entry.identity)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn has_applied(&self, job_url: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_url = $1 AND status = 'applied')",
        )
        .bind(job_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn token_expiry_is_inclusive_of_the_past() {
        let expired = SessionToken {
            value: "c".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
        };
        assert!(expired.is_expired());

        let fresh = SessionToken {
            value: "c".to_string(),
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        };
        assert!(!fresh.is_expired());
    }

    #[test]
    fn status_maps_to_log_strings() {
        assert_eq!(ApplyStatus::Applied.as_str(), "applied");
        assert_eq!(ApplyStatus::Error.as_str(), "error");
    }
}
