//! SQLite store for the catalog and the session log.
//!
//! Uses a single SQLite database file with three tables:
//! - `colleges`: one row per college, name unique
//! - `branches`: one row per branch, `college_id` references `colleges(id)`
//!   with `ON DELETE CASCADE`
//! - `chat_turns`: append-only chat log, timestamps in microseconds
//!
//! Ordered list fields on branches are stored as JSON text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathwise_core::catalog::{Branch, CatalogReader, CatalogSnapshot, CatalogWriter, College};
use pathwise_core::error::{CatalogError, StorageError};
use pathwise_core::session::{ConversationTurn, SessionId, SessionLog};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// A production SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database from a file path or `sqlite:` URL.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StorageError> {
        let in_memory = path.contains(":memory:");
        if !in_memory {
            let file = path.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = std::path::Path::new(file).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StorageError::Storage(format!("Failed to create database directory: {e}"))
                    })?;
                }
            }
        }
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StorageError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("foreign_keys", "ON");

        // Every connection to ":memory:" is a separate database, so keep
        // exactly one alive for the lifetime of the pool.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS colleges (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                name         TEXT UNIQUE NOT NULL CHECK (length(name) > 0),
                location     TEXT NOT NULL,
                ranking      INTEGER,
                established  INTEGER,
                website      TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("colleges table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS branches (
                iid                  INTEGER PRIMARY KEY AUTOINCREMENT,
                id                   TEXT UNIQUE NOT NULL,
                name                 TEXT NOT NULL,
                college_id           TEXT NOT NULL REFERENCES colleges(id) ON DELETE CASCADE,
                description          TEXT NOT NULL,
                risks                TEXT NOT NULL DEFAULT '[]',
                advantages           TEXT NOT NULL DEFAULT '[]',
                career_prospects     TEXT NOT NULL DEFAULT '[]',
                required_skills      TEXT NOT NULL DEFAULT '[]',
                average_salary       REAL NOT NULL DEFAULT 0.0,
                course_duration      INTEGER NOT NULL DEFAULT 4,
                eligibility_criteria TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("branches table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_turns (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id   TEXT NOT NULL,
                user_input   TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("chat_turns table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_turns_session ON chat_turns(session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("session index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_branches_college ON branches(college_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationFailed(format!("college index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_college(row: &SqliteRow) -> Result<College, StorageError> {
        let ranking: Option<i64> = column(row, "ranking")?;
        let established: Option<i64> = column(row, "established")?;
        Ok(College {
            id: column(row, "id")?,
            name: column(row, "name")?,
            location: column(row, "location")?,
            ranking: ranking.and_then(|r| u32::try_from(r).ok()),
            established: established.and_then(|y| u16::try_from(y).ok()),
            website: column(row, "website")?,
        })
    }

    fn row_to_branch(row: &SqliteRow) -> Result<Branch, StorageError> {
        let duration: i64 = column(row, "course_duration")?;
        Ok(Branch {
            id: column(row, "id")?,
            name: column(row, "name")?,
            college_id: column(row, "college_id")?,
            description: column(row, "description")?,
            risks: json_list(row, "risks")?,
            advantages: json_list(row, "advantages")?,
            career_prospects: json_list(row, "career_prospects")?,
            required_skills: json_list(row, "required_skills")?,
            average_salary: column(row, "average_salary")?,
            course_duration: u8::try_from(duration).unwrap_or(4),
            eligibility_criteria: column(row, "eligibility_criteria")?,
        })
    }

    fn row_to_turn(row: &SqliteRow) -> Result<ConversationTurn, StorageError> {
        let session_id: String = column(row, "session_id")?;
        let micros: i64 = column(row, "created_at")?;
        Ok(ConversationTurn {
            session_id: SessionId(session_id),
            user_input: column(row, "user_input")?,
            bot_response: column(row, "bot_response")?,
            timestamp: DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now),
        })
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StorageError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StorageError::QueryFailed(format!("{name} column: {e}")))
}

fn json_list(row: &SqliteRow, name: &str) -> Result<Vec<String>, StorageError> {
    let raw: String = column(row, name)?;
    serde_json::from_str(&raw)
        .map_err(|e| StorageError::QueryFailed(format!("{name} column is not a JSON list: {e}")))
}

fn to_json(list: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(list)
        .map_err(|e| StorageError::Storage(format!("List serialization: {e}")))
}

#[async_trait]
impl CatalogReader for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list_colleges(&self) -> Result<Vec<College>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM colleges ORDER BY iid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("SELECT colleges: {e}")))?;

        Ok(rows
            .iter()
            .map(Self::row_to_college)
            .collect::<Result<_, _>>()?)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM branches ORDER BY iid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("SELECT branches: {e}")))?;

        Ok(rows
            .iter()
            .map(Self::row_to_branch)
            .collect::<Result<_, _>>()?)
    }

    async fn get_branch(&self, id: &str) -> Result<Option<Branch>, CatalogError> {
        let row = sqlx::query("SELECT * FROM branches WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("SELECT branch: {e}")))?;

        Ok(row.as_ref().map(Self::row_to_branch).transpose()?)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl CatalogWriter for SqliteStore {
    async fn replace_catalog(&self, snapshot: CatalogSnapshot) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Storage(format!("BEGIN failed: {e}")))?;

        // Branches go with their colleges via ON DELETE CASCADE.
        sqlx::query("DELETE FROM colleges")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("DELETE colleges: {e}")))?;
        sqlx::query("DELETE FROM branches")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("DELETE branches: {e}")))?;

        for college in &snapshot.colleges {
            sqlx::query(
                r#"
                INSERT INTO colleges (id, name, location, ranking, established, website)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&college.id)
            .bind(&college.name)
            .bind(&college.location)
            .bind(college.ranking.map(i64::from))
            .bind(college.established.map(i64::from))
            .bind(&college.website)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("INSERT college {}: {e}", college.name)))?;
        }

        for branch in &snapshot.branches {
            sqlx::query(
                r#"
                INSERT INTO branches (id, name, college_id, description, risks, advantages,
                    career_prospects, required_skills, average_salary, course_duration,
                    eligibility_criteria)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&branch.id)
            .bind(&branch.name)
            .bind(&branch.college_id)
            .bind(&branch.description)
            .bind(to_json(&branch.risks)?)
            .bind(to_json(&branch.advantages)?)
            .bind(to_json(&branch.career_prospects)?)
            .bind(to_json(&branch.required_skills)?)
            .bind(branch.average_salary)
            .bind(i64::from(branch.course_duration))
            .bind(&branch.eligibility_criteria)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("INSERT branch {}: {e}", branch.name)))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Storage(format!("COMMIT failed: {e}")))?;

        info!(
            colleges = snapshot.colleges.len(),
            branches = snapshot.branches.len(),
            "Catalog replaced"
        );
        Ok(())
    }
}

#[async_trait]
impl SessionLog for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(
        &self,
        session_id: &SessionId,
        user_input: &str,
        bot_response: &str,
    ) -> Result<ConversationTurn, StorageError> {
        // One statement, so the clamp and the insert take the write lock together.
        let created_at: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO chat_turns (session_id, user_input, bot_response, created_at)
            VALUES (
                ?1, ?2, ?3,
                MAX(?4, COALESCE(
                    (SELECT MAX(created_at) FROM chat_turns WHERE session_id = ?1), 0
                ))
            )
            RETURNING created_at
            "#,
        )
        .bind(session_id.as_str())
        .bind(user_input)
        .bind(bot_response)
        .bind(Utc::now().timestamp_micros())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Storage(format!("INSERT turn: {e}")))?;

        debug!(session = %session_id, "Stored chat turn");
        Ok(ConversationTurn {
            session_id: session_id.clone(),
            user_input: user_input.to_string(),
            bot_response: bot_response.to_string(),
            timestamp: DateTime::from_timestamp_micros(created_at).unwrap_or_else(Utc::now),
        })
    }

    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_turns WHERE session_id = ?1 ORDER BY created_at ASC, iid ASC",
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("SELECT history: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }
}
