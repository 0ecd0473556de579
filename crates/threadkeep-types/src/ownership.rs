//! User and thread ownership records.
//!
//! These live in the relational store next to (never inside) the per-thread
//! message units. A thread's title and owner are here; its messages are not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ownership and title metadata for one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for finding-or-creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Input for registering a thread under a user.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadInput {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Input for renaming a thread.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadTitleUpdate {
    #[serde(default)]
    pub title: Option<String>,
}
