//! SQLite thread storage unit.
//!
//! Implements `ThreadStore` from `threadkeep-core` over one database file per
//! thread. The unit holds a single-connection pool: its actor is the only
//! caller, so there is never more than one statement in flight.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use threadkeep_core::thread::codec::{self, MessageRecord};
use threadkeep_core::thread::store::ThreadStore;
use threadkeep_types::error::ThreadStoreError;
use threadkeep_types::message::Message;
use tracing::debug;

use super::schema;

/// One thread's durable message log.
pub struct SqliteThreadUnit {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteThreadUnit {
    /// Open (creating if missing) the unit at `path` and bring its schema up
    /// to date. Schema failures are returned, never swallowed.
    pub async fn open(path: &Path, busy_timeout: Duration) -> Result<Self, ThreadStoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(unavailable)?;

        let added = schema::ensure_schema(&pool).await?;
        debug!(path = %path.display(), migrated = added.len(), "thread unit ready");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Location of the unit's database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record_from_row(row: &SqliteRow) -> Result<MessageRecord, sqlx::Error> {
    Ok(MessageRecord {
        id: row.try_get("id")?,
        role: row.try_get("role")?,
        parts: row.try_get("parts")?,
        metadata: row.try_get("metadata")?,
        created_at: row.try_get("created_at")?,
    })
}

async fn insert_record<'e, E>(executor: E, record: &MessageRecord) -> Result<(), ThreadStoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO messages (id, role, parts, metadata, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.role)
    .bind(&record.parts)
    .bind(&record.metadata)
    .bind(&record.created_at)
    .execute(executor)
    .await
    .map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            ThreadStoreError::DuplicateId(record.id.clone())
        } else {
            unavailable(e)
        }
    })?;

    Ok(())
}

fn unavailable(e: sqlx::Error) -> ThreadStoreError {
    ThreadStoreError::StorageUnavailable(e.to_string())
}

// ---------------------------------------------------------------------------
// ThreadStore implementation
// ---------------------------------------------------------------------------

impl ThreadStore for SqliteThreadUnit {
    async fn get_messages(&self) -> Result<Vec<Message>, ThreadStoreError> {
        // rowid breaks created_at ties in insertion order.
        let rows = sqlx::query(
            "SELECT id, role, parts, metadata, created_at FROM messages ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = record_from_row(row).map_err(|e| ThreadStoreError::CorruptRecord {
                id: row.try_get("id").unwrap_or_default(),
                reason: e.to_string(),
            })?;
            messages.push(codec::decode(record)?);
        }

        Ok(messages)
    }

    async fn append_message(&self, message: &Message) -> Result<(), ThreadStoreError> {
        let record = codec::encode(message)?;
        insert_record(&self.pool, &record).await
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), ThreadStoreError> {
        let records = messages
            .iter()
            .map(codec::encode)
            .collect::<Result<Vec<_>, _>>()?;

        // Dropping the transaction on any error rolls the delete back.
        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        for record in &records {
            insert_record(&mut *tx, record).await?;
        }
        tx.commit().await.map_err(unavailable)?;

        Ok(())
    }

    async fn delete_message(&self, id: &str) -> Result<(), ThreadStoreError> {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), ThreadStoreError> {
        sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn message_count(&self) -> Result<u64, ThreadStoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;

        let count: i64 = row.try_get("cnt").map_err(unavailable)?;
        Ok(count as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(path = %self.path.display(), "thread unit closed");
    }
}
