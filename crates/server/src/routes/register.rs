use super::to_document;
use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Account payload for the `users` collection.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Store an account in `users`. No uniqueness check applies here.
pub async fn register(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(user) = payload?;
    state.users().insert_one(to_document(&user)?).await?;
    Ok(StatusCode::CREATED)
}
