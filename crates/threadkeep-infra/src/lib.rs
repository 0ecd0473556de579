//! Infrastructure layer for threadkeep.
//!
//! Contains implementations of the traits defined in `threadkeep-core`:
//! SQLite-backed thread storage units (one database file per thread), the
//! SQLite ownership repository, and data directory / config loading.

pub mod config;
pub mod filesystem;
pub mod sqlite;
