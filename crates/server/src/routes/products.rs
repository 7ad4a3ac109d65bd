use super::{parse_id, to_document};
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dositio::store::{Document, Filter, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Product creation payload
///
/// `name` is required and is what the duplicate check keys on; any other
/// attributes (price, category, ...) are stored as given.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(flatten)]
    pub attributes: Document,
}

/// List all products
pub async fn list_products(State(state): State<Arc<ServerState>>) -> ServerResult<Json<Vec<Record>>> {
    let products = state.products().find(&Filter::all()).await?;
    Ok(Json(products))
}

/// Create a product
///
/// Duplicate names never reach this handler; the route's guard chain
/// rejects them first.
pub async fn create_product(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(product) = payload?;
    let id = state.products().insert_one(to_document(&product)?).await?;

    tracing::info!(product = %product.name, id = %id, "product created");
    Ok(StatusCode::CREATED)
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Record>> {
    let id = parse_id(&id)?;
    state
        .products()
        .find_one(&Filter::by_id(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

/// Patch a product by ID
///
/// Fields present in the payload replace the stored ones; others are kept.
pub async fn update_product(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    state.products().update_one(&Filter::by_id(id), patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product by ID
pub async fn delete_product(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let id = parse_id(&id)?;
    state.products().delete_one(&Filter::by_id(id)).await?;

    tracing::info!(id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
