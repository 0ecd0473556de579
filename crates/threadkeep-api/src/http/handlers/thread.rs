//! Thread message handlers.
//!
//! Endpoints:
//! - GET    /threads/{id}                          - Ordered messages (empty for a new thread)
//! - POST   /threads/{id}                          - Append one message
//! - PUT    /threads/{id}                          - Replace the whole sequence
//! - DELETE /threads/{id}                          - Clear the thread
//! - DELETE /threads/{id}/messages/{message_id}    - Delete one message
//!
//! Each request resolves the thread's actor and awaits its reply, so
//! concurrent requests against one thread are applied one at a time.

use axum::Json;
use axum::extract::{Path, State};

use threadkeep_types::message::Message;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /threads/{id}
pub async fn get_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let handle = state.locator.resolve(&thread_id).await?;
    Ok(Json(handle.get_messages().await?))
}

/// POST /threads/{id}
pub async fn append_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(message): Json<Message>,
) -> Result<&'static str, AppError> {
    let handle = state.locator.resolve(&thread_id).await?;
    handle.append_message(message).await?;
    Ok("OK")
}

/// PUT /threads/{id}
pub async fn save_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(messages): Json<Vec<Message>>,
) -> Result<&'static str, AppError> {
    let handle = state.locator.resolve(&thread_id).await?;
    handle.save_messages(messages).await?;
    Ok("OK")
}

/// DELETE /threads/{id}
pub async fn clear_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<&'static str, AppError> {
    let handle = state.locator.resolve(&thread_id).await?;
    handle.clear().await?;
    Ok("OK")
}

/// DELETE /threads/{id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    Path((thread_id, message_id)): Path<(String, String)>,
) -> Result<&'static str, AppError> {
    let handle = state.locator.resolve(&thread_id).await?;
    handle.delete_message(message_id).await?;
    Ok("OK")
}
