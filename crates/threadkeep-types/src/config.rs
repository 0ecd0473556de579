//! Global configuration types for threadkeep.
//!
//! `GlobalConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Bounded mailbox size of each thread's actor.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// SQLite busy timeout for thread storage units, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Release a thread's storage unit after this long without requests.
    /// `0` keeps units open until evicted by `max_resident_threads`.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Upper bound on open thread storage units not currently in use.
    #[serde(default = "default_max_resident_threads")]
    pub max_resident_threads: usize,
}

fn default_mailbox_capacity() -> usize {
    64
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_idle_timeout_ms() -> u64 {
    300_000
}

fn default_max_resident_threads() -> usize {
    128
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            busy_timeout_ms: default_busy_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_resident_threads: default_max_resident_threads(),
        }
    }
}
