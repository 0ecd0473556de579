//! Data directory layout.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   threadkeep.db        ownership store
//!   threads/{hash}.db    one storage unit per thread
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "THREADKEEP_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `THREADKEEP_DATA_DIR` environment variable
/// 2. `~/.threadkeep`
/// 3. `.threadkeep` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(env_value: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_value.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = home {
        return home.join(".threadkeep");
    }

    PathBuf::from(".threadkeep")
}

/// Directory holding the per-thread database files.
pub fn threads_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("threads")
}
