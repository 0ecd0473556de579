//! Maps thread identifiers to SQLite unit files.
//!
//! A thread id is an arbitrary string, so it is never used as a file name
//! directly: each unit lives at `{threads_dir}/{sha256_hex(thread_id)}.db`.

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};
use threadkeep_core::thread::store::UnitFactory;
use threadkeep_types::error::ThreadStoreError;

use super::thread::SqliteThreadUnit;

/// Opens one SQLite database file per thread under a common directory.
pub struct SqliteUnitFactory {
    threads_dir: PathBuf,
    busy_timeout: Duration,
}

impl SqliteUnitFactory {
    /// Create a factory storing units under `threads_dir`.
    pub fn new(threads_dir: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            threads_dir: threads_dir.into(),
            busy_timeout,
        }
    }

    /// Database file backing `thread_id`. The file may not exist yet.
    pub fn unit_path(&self, thread_id: &str) -> PathBuf {
        self.threads_dir.join(format!("{}.db", unit_file_stem(thread_id)))
    }
}

/// Lowercase hex SHA-256 of the thread id.
pub fn unit_file_stem(thread_id: &str) -> String {
    let digest = Sha256::digest(thread_id.as_bytes());
    format!("{:x}", digest)
}

impl UnitFactory for SqliteUnitFactory {
    type Unit = SqliteThreadUnit;

    async fn open(&self, thread_id: &str) -> Result<SqliteThreadUnit, ThreadStoreError> {
        tokio::fs::create_dir_all(&self.threads_dir)
            .await
            .map_err(|e| {
                ThreadStoreError::StorageUnavailable(format!(
                    "cannot create {}: {e}",
                    self.threads_dir.display()
                ))
            })?;

        SqliteThreadUnit::open(&self.unit_path(thread_id), self.busy_timeout).await
    }
}
