//! User and thread-ownership handlers.
//!
//! Endpoints:
//! - POST  /users                               - Find-or-create a user
//! - GET   /users/{user_id}/threads             - Threads owned by a user
//! - POST  /users/{user_id}/threads             - Register a thread
//! - GET   /users/{user_id}/threads/{thread_id} - One owned thread
//! - PATCH /users/{user_id}/threads/{thread_id} - Rename a thread

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use threadkeep_core::repository::ownership::OwnershipRepository;
use threadkeep_types::error::RepositoryError;
use threadkeep_types::ownership::{ThreadInput, ThreadRecord, ThreadTitleUpdate, User, UserInput};

use crate::http::error::AppError;
use crate::state::AppState;

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// POST /users
///
/// `201` with the new user, `200` with the refreshed user when it existed.
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> Result<(StatusCode, Json<User>), AppError> {
    require("id", &input.id)?;
    require("email", &input.email)?;

    let (user, created) = state.ownership.upsert_user(&input).await?;
    let status = if created {
        tracing::info!(user_id = %user.id, "created user");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user)))
}

/// GET /users/{user_id}/threads
pub async fn list_threads(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ThreadRecord>>, AppError> {
    Ok(Json(state.ownership.list_threads(&user_id).await?))
}

/// POST /users/{user_id}/threads
pub async fn create_thread(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<ThreadInput>,
) -> Result<(StatusCode, Json<ThreadRecord>), AppError> {
    require("id", &input.id)?;

    let thread = state.ownership.create_thread(&user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

/// GET /users/{user_id}/threads/{thread_id}
pub async fn get_thread(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Result<Json<ThreadRecord>, AppError> {
    let thread = state
        .ownership
        .get_owned_thread(&user_id, &thread_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(thread))
}

/// PATCH /users/{user_id}/threads/{thread_id}
pub async fn update_thread(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
    Json(update): Json<ThreadTitleUpdate>,
) -> Result<&'static str, AppError> {
    state
        .ownership
        .update_thread_title(&user_id, &thread_id, update.title.as_deref())
        .await?;
    Ok("OK")
}
