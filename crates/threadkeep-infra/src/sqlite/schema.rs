//! Schema setup for a thread storage unit.
//!
//! Versionless and additive: the `messages` table is created if absent, then
//! the live column set is probed and any optional column introduced since the
//! table was first created is added with `ALTER TABLE ... ADD COLUMN`.
//! Columns are never dropped, narrowed, or renamed, so rows written by older
//! builds stay readable.

use std::collections::HashSet;

use sqlx::{Row, SqlitePool};
use threadkeep_types::error::ThreadStoreError;
use tracing::info;

const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    role TEXT NOT NULL,
    parts TEXT NOT NULL,
    metadata TEXT,
    created_at TEXT NOT NULL
)"#;

/// Optional columns that older tables may lack, as `(name, type)`.
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[("metadata", "TEXT")];

/// Ensure the `messages` table exists with every current column.
///
/// Returns the names of the columns that had to be added (empty when the
/// schema was already current).
pub async fn ensure_schema(pool: &SqlitePool) -> Result<Vec<&'static str>, ThreadStoreError> {
    sqlx::query(CREATE_MESSAGES_TABLE)
        .execute(pool)
        .await
        .map_err(|e| schema_error("create messages table", e))?;

    let existing = column_names(pool).await?;
    let mut added = Vec::new();

    for &(name, sql_type) in ADDITIVE_COLUMNS {
        if existing.contains(name) {
            continue;
        }
        sqlx::query(&format!("ALTER TABLE messages ADD COLUMN {name} {sql_type}"))
            .execute(pool)
            .await
            .map_err(|e| schema_error("add column", e))?;
        info!(column = name, "migrated messages table");
        added.push(name);
    }

    Ok(added)
}

/// Current column names of the `messages` table.
pub async fn column_names(pool: &SqlitePool) -> Result<HashSet<String>, ThreadStoreError> {
    let rows = sqlx::query("PRAGMA table_info(messages)")
        .fetch_all(pool)
        .await
        .map_err(|e| schema_error("inspect messages table", e))?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<Result<_, _>>()
        .map_err(|e| schema_error("read column name", e))
}

fn schema_error(step: &str, e: sqlx::Error) -> ThreadStoreError {
    ThreadStoreError::StorageUnavailable(format!("schema setup failed ({step}): {e}"))
}
