//! SQLite ownership repository implementation.
//!
//! Implements `OwnershipRepository` from `threadkeep-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, RFC 3339
//! timestamps with fixed microsecond precision so they sort as text.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use threadkeep_core::repository::ownership::OwnershipRepository;
use threadkeep_types::error::RepositoryError;
use threadkeep_types::ownership::{ThreadInput, ThreadRecord, User, UserInput};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `OwnershipRepository`.
pub struct SqliteOwnershipRepository {
    pool: DatabasePool,
}

impl SqliteOwnershipRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ThreadRow {
    id: String,
    user_id: String,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ThreadRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<ThreadRecord, RepositoryError> {
        Ok(ThreadRecord {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn thread_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ThreadRecord, RepositoryError> {
    ThreadRow::from_row(row).map_err(query_error)?.into_record()
}

// ---------------------------------------------------------------------------
// OwnershipRepository implementation
// ---------------------------------------------------------------------------

impl OwnershipRepository for SqliteOwnershipRepository {
    async fn upsert_user(&self, input: &UserInput) -> Result<(User, bool), RepositoryError> {
        let now = now_timestamp();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let existing = sqlx::query("SELECT id FROM users WHERE id = ?")
            .bind(&input.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        let created = existing.is_none();

        if created {
            sqlx::query(
                "INSERT INTO users (id, email, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&input.id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        } else {
            sqlx::query("UPDATE users SET email = ?, name = ?, updated_at = ? WHERE id = ?")
                .bind(&input.email)
                .bind(&input.name)
                .bind(&now)
                .bind(&input.id)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(&input.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
        tx.commit().await.map_err(query_error)?;

        let user = UserRow::from_row(&row).map_err(query_error)?.into_user()?;
        Ok((user, created))
    }

    async fn list_threads(&self, user_id: &str) -> Result<Vec<ThreadRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM threads WHERE user_id = ? ORDER BY updated_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(thread_from_row).collect()
    }

    async fn create_thread(
        &self,
        user_id: &str,
        input: &ThreadInput,
    ) -> Result<ThreadRecord, RepositoryError> {
        let now = now_timestamp();

        sqlx::query(
            "INSERT OR IGNORE INTO threads (id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                RepositoryError::NotFound
            } else {
                query_error(e)
            }
        })?;

        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(&input.id)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_error)?;
        let record = thread_from_row(&row)?;

        if record.user_id != user_id {
            return Err(RepositoryError::Conflict(format!(
                "thread '{}' belongs to another user",
                input.id
            )));
        }

        Ok(record)
    }

    async fn get_owned_thread(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ? AND user_id = ?")
            .bind(thread_id)
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(thread_from_row).transpose()
    }

    async fn update_thread_title(
        &self,
        user_id: &str,
        thread_id: &str,
        title: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE threads SET title = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(title)
        .bind(now_timestamp())
        .bind(thread_id)
        .bind(user_id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;

    async fn test_repo() -> (tempfile::TempDir, SqliteOwnershipRepository) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        (dir, SqliteOwnershipRepository::new(pool))
    }

    fn user_input(id: &str, email: &str) -> UserInput {
        UserInput {
            id: id.to_string(),
            email: email.to_string(),
            name: Some("Ada".to_string()),
        }
    }

    fn thread_input(id: &str, title: Option<&str>) -> ThreadInput {
        ThreadInput {
            id: id.to_string(),
            title: title.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upsert_user_creates_then_updates() {
        let (_dir, repo) = test_repo().await;

        let (user, created) = repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();
        assert!(created);
        assert_eq!(user.email, "a@example.com");

        let (user, created) = repo.upsert_user(&user_input("u1", "b@example.com")).await.unwrap();
        assert!(!created);
        assert_eq!(user.email, "b@example.com");
        assert!(user.updated_at >= user.created_at);
    }

    #[tokio::test]
    async fn test_create_thread_is_idempotent() {
        let (_dir, repo) = test_repo().await;
        repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();

        let first = repo.create_thread("u1", &thread_input("t1", Some("Hello"))).await.unwrap();
        let again = repo.create_thread("u1", &thread_input("t1", Some("Other"))).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(again.title.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_create_thread_for_unknown_user_is_not_found() {
        let (_dir, repo) = test_repo().await;
        let err = repo.create_thread("ghost", &thread_input("t1", None)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_create_thread_owned_by_someone_else_conflicts() {
        let (_dir, repo) = test_repo().await;
        repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();
        repo.upsert_user(&user_input("u2", "b@example.com")).await.unwrap();
        repo.create_thread("u1", &thread_input("t1", None)).await.unwrap();

        let err = repo.create_thread("u2", &thread_input("t1", None)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ownership_check() {
        let (_dir, repo) = test_repo().await;
        repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();
        repo.upsert_user(&user_input("u2", "b@example.com")).await.unwrap();
        repo.create_thread("u1", &thread_input("t1", None)).await.unwrap();

        assert!(repo.get_owned_thread("u1", "t1").await.unwrap().is_some());
        assert!(repo.get_owned_thread("u2", "t1").await.unwrap().is_none());
        assert!(repo.get_owned_thread("u1", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_threads_most_recent_first() {
        let (_dir, repo) = test_repo().await;
        repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();
        repo.create_thread("u1", &thread_input("t1", None)).await.unwrap();
        repo.create_thread("u1", &thread_input("t2", None)).await.unwrap();

        repo.update_thread_title("u1", "t1", Some("Renamed")).await.unwrap();

        let threads = repo.list_threads("u1").await.unwrap();
        let ids: Vec<&str> = threads.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(threads[0].title.as_deref(), Some("Renamed"));

        assert!(repo.list_threads("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_title_requires_ownership() {
        let (_dir, repo) = test_repo().await;
        repo.upsert_user(&user_input("u1", "a@example.com")).await.unwrap();
        repo.create_thread("u1", &thread_input("t1", None)).await.unwrap();

        let err = repo.update_thread_title("u2", "t1", Some("x")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        repo.update_thread_title("u1", "t1", None).await.unwrap();
        let thread = repo.get_owned_thread("u1", "t1").await.unwrap().unwrap();
        assert!(thread.title.is_none());
    }
}
