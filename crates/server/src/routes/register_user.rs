use super::to_document;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dositio::login::PASSWORD_KEY;
use dositio::store::{Filter, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Self-registration payload. These users can log in through `/auth`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Registration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    pub password: String,
}

/// List registered users, without their passwords.
pub async fn list_registered_users(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<Json<Vec<Record>>> {
    let users = state
        .registered_users()
        .find(&Filter::all())
        .await?
        .into_iter()
        .map(|user| user.without(PASSWORD_KEY))
        .collect();
    Ok(Json(users))
}

/// Register a new user
///
/// Taken usernames are rejected by the route's guard chain before this runs.
pub async fn register_user(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(registration) = payload?;
    state
        .registered_users()
        .insert_one(to_document(&registration)?)
        .await?;

    tracing::info!(username = %registration.username, "user registered");
    Ok(StatusCode::CREATED)
}
