pub mod assessments;
pub mod companies;
pub mod reports;

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the daemon indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
pub(crate) async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthSessionRow {
    /// SHA-256 hex digest of the bearer token. Plaintext tokens are never stored.
    pub token_hash: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct CompanyRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssessmentRow {
    pub id: String,
    pub company_id: String,
    pub name: String,
    /// `exploratory` | `migration`
    pub assessment_type: String,
    /// `draft` | `in_progress` | `completed` — derived, never client-set.
    pub status: String,
    /// JSON document: `map<category_id, map<question_id, answer>>`.
    pub responses: String,
    /// JSON document: `map<category_id, {status, completion_percentage, last_modified}>`.
    pub category_statuses: String,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub id: String,
    pub assessment_id: String,
    pub company_id: String,
    /// Denormalized at generation time so the report reads standalone.
    pub company_name: String,
    pub assessment_name: String,
    pub assessment_path: String,
    pub html_content: String,
    pub generated_at: String,
    pub generated_by: String,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("rapidd.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::bootstrap_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS users (
                id            TEXT PRIMARY KEY,
                email         TEXT NOT NULL UNIQUE,
                display_name  TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at    TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                token_hash TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS companies (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_by  TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS assessments (
                id                TEXT PRIMARY KEY,
                company_id        TEXT NOT NULL,
                name              TEXT NOT NULL,
                assessment_type   TEXT NOT NULL,
                status            TEXT NOT NULL DEFAULT 'draft',
                responses         TEXT NOT NULL DEFAULT '{}',
                category_statuses TEXT NOT NULL DEFAULT '{}',
                created_by        TEXT NOT NULL,
                created_at        TEXT NOT NULL,
                updated_at        TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS reports (
                id              TEXT PRIMARY KEY,
                assessment_id   TEXT NOT NULL UNIQUE,
                company_id      TEXT NOT NULL,
                company_name    TEXT NOT NULL,
                assessment_name TEXT NOT NULL,
                assessment_path TEXT NOT NULL,
                html_content    TEXT NOT NULL,
                generated_at    TEXT NOT NULL,
                generated_by    TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_assessments_company ON assessments(company_id)",
            "CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id)",
        ];
        for stmt in statements {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("bootstrap schema")?;
        }
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn count_users(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    // ─── Auth sessions ──────────────────────────────────────────────────────

    pub async fn create_auth_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(&now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_auth_session(&self, token_hash: &str) -> Result<Option<AuthSessionRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM auth_sessions WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn delete_auth_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete sessions past their expiry. Returns the number removed.
    pub async fn prune_expired_auth_sessions(&self) -> Result<u64> {
        with_timeout(async {
            let now = Utc::now().to_rfc3339();
            let n = sqlx::query("DELETE FROM auth_sessions WHERE expires_at < ?")
                .bind(&now)
                .execute(&self.pool)
                .await?
                .rows_affected();
            Ok(n)
        })
        .await
    }

    // ─── Maintenance ────────────────────────────────────────────────────────

    /// Delete draft assessments untouched for `days` days. Pass `0` to skip.
    pub async fn prune_stale_drafts(&self, days: u32) -> Result<u64> {
        if days == 0 {
            return Ok(0);
        }
        with_timeout(async {
            let cutoff = (Utc::now() - chrono::Duration::days(days as i64)).to_rfc3339();
            let n = sqlx::query(
                "DELETE FROM assessments WHERE status = 'draft' AND updated_at < ?",
            )
            .bind(&cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();
            Ok(n)
        })
        .await
    }

    /// Run SQLite VACUUM to reclaim disk space after pruning.
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}
