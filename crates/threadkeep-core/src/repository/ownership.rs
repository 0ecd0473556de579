//! OwnershipRepository trait definition.
//!
//! The relational side of threadkeep: which users exist and which threads
//! they own, plus thread titles. Message content never goes through here.

use std::future::Future;

use threadkeep_types::error::RepositoryError;
use threadkeep_types::ownership::{ThreadInput, ThreadRecord, User, UserInput};

/// Repository trait for user and thread-ownership records.
///
/// Implementations live in threadkeep-infra (e.g., `SqliteOwnershipRepository`).
pub trait OwnershipRepository: Send + Sync {
    /// Find-or-create a user.
    ///
    /// An existing user gets its email/name refreshed. The flag is `true`
    /// when the user was newly inserted.
    fn upsert_user(
        &self,
        input: &UserInput,
    ) -> impl Future<Output = Result<(User, bool), RepositoryError>> + Send;

    /// Threads owned by a user, most recently updated first.
    fn list_threads(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<ThreadRecord>, RepositoryError>> + Send;

    /// Register a thread under a user. Registering an existing thread id is
    /// not an error: the stored record is returned unchanged.
    fn create_thread(
        &self,
        user_id: &str,
        input: &ThreadInput,
    ) -> impl Future<Output = Result<ThreadRecord, RepositoryError>> + Send;

    /// The thread if it exists and belongs to `user_id`.
    fn get_owned_thread(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> impl Future<Output = Result<Option<ThreadRecord>, RepositoryError>> + Send;

    /// Set (or clear) a thread's title.
    ///
    /// Returns `NotFound` when no thread with that id belongs to `user_id`.
    fn update_thread_title(
        &self,
        user_id: &str,
        thread_id: &str,
        title: Option<&str>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
