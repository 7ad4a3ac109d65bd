use super::{parse_id, to_document};
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dositio::store::{Document, Filter, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Field of a product naming the category it belongs to.
const PRODUCT_CATEGORY_KEY: &str = "category";

/// Category payload, used for both creation and update.
#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub img_url: String,
}

pub async fn list_categories(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<Json<Vec<Record>>> {
    let categories = state.categories().find(&Filter::all()).await?;
    tracing::debug!(count = categories.len(), "listing categories");
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<CategoryPayload>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(category) = payload?;
    state.categories().insert_one(to_document(&category)?).await?;

    tracing::info!(category = %category.name, "including category");
    Ok(StatusCode::CREATED)
}

async fn find_category(state: &ServerState, raw_id: &str) -> ServerResult<Record> {
    let id = parse_id(raw_id)?;
    state
        .categories()
        .find_one(&Filter::by_id(id))
        .await?
        .ok_or(ServerError::NotFound)
}

pub async fn get_category(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Record>> {
    find_category(&state, &id).await.map(Json)
}

/// Products whose `category` field equals the category's name.
pub async fn category_products(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<Record>>> {
    let category = find_category(&state, &id).await?;
    let Some(name) = category.get("name").and_then(Value::as_str) else {
        return Ok(Json(Vec::new()));
    };

    let products = state
        .products()
        .find(&Filter::all().eq(PRODUCT_CATEGORY_KEY, name))
        .await?;
    Ok(Json(products))
}

/// Replace a category's `name` and `img_url`.
pub async fn update_category(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryPayload>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let id = parse_id(&id)?;
    let Json(category) = payload?;

    let mut patch = Document::new();
    patch.insert("name".into(), Value::String(category.name));
    patch.insert("img_url".into(), Value::String(category.img_url));

    state.categories().update_one(&Filter::by_id(id), patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_category(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let id = parse_id(&id)?;
    state.categories().delete_one(&Filter::by_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
