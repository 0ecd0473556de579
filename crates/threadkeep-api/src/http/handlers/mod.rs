//! HTTP request handlers.

pub mod health;
pub mod thread;
pub mod user;
