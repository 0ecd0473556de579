//! HTTP/REST API layer for threadkeep.
//!
//! Axum-based API exposing thread message storage and the ownership store.
//! Success bodies are plain JSON; errors use a small `errors`/`meta` body.

pub mod error;
pub mod handlers;
pub mod router;
