//! ThreadStore and UnitFactory trait definitions.
//!
//! Implementations live in threadkeep-infra (e.g., `SqliteThreadUnit`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use std::future::Future;

use threadkeep_types::error::ThreadStoreError;
use threadkeep_types::message::Message;

/// The durable message log of exactly one thread.
///
/// A unit is never shared between threads, and callers reach it only through
/// its actor, so implementations may assume calls arrive one at a time.
pub trait ThreadStore: Send + Sync {
    /// All messages, ordered by `created_at` ascending, ties in insertion order.
    fn get_messages(
        &self,
    ) -> impl Future<Output = Result<Vec<Message>, ThreadStoreError>> + Send;

    /// Insert one new message.
    ///
    /// Returns `DuplicateId` if the id is already stored; the stored sequence
    /// is left untouched in that case.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl Future<Output = Result<(), ThreadStoreError>> + Send;

    /// Replace the whole sequence with `messages`, all or nothing.
    fn save_messages(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<(), ThreadStoreError>> + Send;

    /// Remove one message. Absent ids are a no-op.
    fn delete_message(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), ThreadStoreError>> + Send;

    /// Remove every message. The unit stays usable.
    fn clear(&self) -> impl Future<Output = Result<(), ThreadStoreError>> + Send;

    /// Number of stored messages.
    fn message_count(&self) -> impl Future<Output = Result<u64, ThreadStoreError>> + Send;

    /// Release the unit's resources. Called once by its actor on shutdown;
    /// no other operation follows.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Opens (creating if needed) the storage unit for a thread identifier.
pub trait UnitFactory: Send + Sync {
    type Unit: ThreadStore + 'static;

    /// Open the unit for `thread_id`, running schema setup before returning.
    ///
    /// Opening an unknown id materializes empty storage for it.
    fn open(
        &self,
        thread_id: &str,
    ) -> impl Future<Output = Result<Self::Unit, ThreadStoreError>> + Send;
}
