//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the dositio
//! server, together with the routing table that declares each route's
//! access policy. Routes are organized by resource:
//!
//! - `health`: Liveness and Prometheus metrics
//! - `auth`: Credential login
//! - `products`: Product catalog CRUD
//! - `categories`: Category CRUD and per-category product listing
//! - `register_user`: Self-registration and registered-user listing
//! - `register`: Plain user registration

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod register;
pub mod register_user;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::Json;
use dositio::store::{Document, ObjectId, StoreError};
use dositio::{Policy, RouteDescriptor};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// One entry of the routing table: the declared route and its handler.
pub struct RouteSpec {
    pub descriptor: RouteDescriptor,
    pub handler: MethodRouter<Arc<ServerState>>,
}

impl RouteSpec {
    fn new(descriptor: RouteDescriptor, handler: MethodRouter<Arc<ServerState>>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }
}

fn route(method: Method, path: &str) -> RouteDescriptor {
    RouteDescriptor::new(method, path)
}

/// Every route the server exposes, in registration order.
pub fn route_table() -> Vec<RouteSpec> {
    vec![
        // Service
        RouteSpec::new(route(Method::GET, "/"), get(api_info)),
        RouteSpec::new(route(Method::GET, "/health"), get(health::health_check)),
        RouteSpec::new(route(Method::GET, "/metrics"), get(health::metrics)),
        // Login
        RouteSpec::new(route(Method::POST, "/auth"), post(auth::login)),
        // Products
        RouteSpec::new(
            route(Method::GET, "/products").with_policy(Policy::authenticated()),
            get(products::list_products),
        ),
        RouteSpec::new(
            route(Method::POST, "/products").with_policy(Policy::authenticated()),
            post(products::create_product),
        ),
        RouteSpec::new(
            route(Method::GET, "/products/{id}"),
            get(products::get_product),
        ),
        RouteSpec::new(
            route(Method::PUT, "/products/{id}").with_policy(Policy::authenticated()),
            put(products::update_product),
        ),
        RouteSpec::new(
            route(Method::DELETE, "/products/{id}").with_policy(Policy::authenticated()),
            delete(products::delete_product),
        ),
        // Categories
        RouteSpec::new(
            route(Method::GET, "/categories").with_policy(Policy::authenticated().logged()),
            get(categories::list_categories),
        ),
        RouteSpec::new(
            route(Method::POST, "/categories").with_policy(Policy::authenticated().admin()),
            post(categories::create_category),
        ),
        RouteSpec::new(
            route(Method::GET, "/categories/{id}"),
            get(categories::get_category),
        ),
        RouteSpec::new(
            route(Method::GET, "/categories/{id}/products"),
            get(categories::category_products),
        ),
        RouteSpec::new(
            route(Method::PUT, "/categories/{id}").with_policy(Policy::authenticated()),
            put(categories::update_category),
        ),
        RouteSpec::new(
            route(Method::DELETE, "/categories/{id}").with_policy(Policy::authenticated()),
            delete(categories::delete_category),
        ),
        // Registration
        RouteSpec::new(
            route(Method::GET, "/registerUser").with_policy(Policy::authenticated().logged()),
            get(register_user::list_registered_users),
        ),
        RouteSpec::new(
            route(Method::POST, "/registerUser").with_policy(Policy::open()),
            post(register_user::register_user),
        ),
        RouteSpec::new(
            route(Method::POST, "/register").with_policy(Policy::open()),
            post(register::register),
        ),
    ]
}

/// Declared routes only, in table order.
pub fn route_descriptors() -> Vec<RouteDescriptor> {
    route_table()
        .into_iter()
        .map(|spec| spec.descriptor)
        .collect()
}

/// `METHOD path` of every route, rendered once for the info endpoint.
static ENDPOINTS: once_cell::sync::Lazy<Vec<String>> = once_cell::sync::Lazy::new(|| {
    route_descriptors()
        .iter()
        .map(ToString::to_string)
        .collect()
});

/// Parse a path id. Anything that is not an id cannot name a record.
pub(crate) fn parse_id(raw: &str) -> ServerResult<ObjectId> {
    raw.parse().map_err(|_| ServerError::NotFound)
}

/// Convert a typed payload into a storable document.
pub(crate) fn to_document<T: Serialize>(payload: &T) -> ServerResult<Document> {
    match serde_json::to_value(payload).map_err(StoreError::from)? {
        Value::Object(map) => Ok(map),
        other => Err(ServerError::BadRequest(format!(
            "Expected a JSON object, got {other}"
        ))),
    }
}

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
///
/// # Response
///
/// ```json
/// {
///   "name": "dositio",
///   "version": "0.1.0",
///   "endpoints": ["GET /", "..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "dositio",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS.as_slice(),
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
