//! Ports and the concurrency core of threadkeep.
//!
//! This crate defines the traits the infrastructure layer implements
//! (`ThreadStore`, `UnitFactory`, `OwnershipRepository`), the codec between
//! messages and their persisted rows, and the per-thread actor that
//! serializes every operation on one thread. It depends only on
//! `threadkeep-types` -- never on `threadkeep-infra` or any database crate.

pub mod repository;
pub mod thread;
