//! Per-thread message storage.
//!
//! Each thread identifier resolves (through [`locator::ThreadLocator`]) to one
//! storage unit owned by one actor task. All operations on that thread go
//! through the actor's mailbox and run one at a time.

pub mod actor;
pub mod codec;
pub mod locator;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
