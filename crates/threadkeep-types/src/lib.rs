//! Shared domain types for threadkeep.
//!
//! This crate contains the types used across the workspace: thread messages
//! and their content parts, the user/thread ownership records, configuration,
//! and the error enums returned by the stores.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod message;
pub mod ownership;
