use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use dositio::{Credentials, LoginToken};
use std::sync::Arc;

/// Exchange credentials of a registered user for an access token
///
/// # Response
///
/// ```json
/// { "x-access-token": "eyJhbGciOiJIUzI1NiJ9..." }
/// ```
///
/// Unknown users and wrong passwords both answer `401 ACCESS_UNAUTHORIZED`.
pub async fn login(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ServerResult<Json<LoginToken>> {
    let Json(credentials) = payload?;
    let users = state.registered_users();
    let token = dositio::login(users.as_ref(), &state.tokens, &credentials).await?;
    Ok(Json(token))
}
