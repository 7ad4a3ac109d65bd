//! Integration tests for the HTTP API
//!
//! Tests: guard enforcement per route, login, resource checks, CRUD handlers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use dositio::store::{Document, Filter, Store};
use dositio::{AccessEntry, AccessLog};
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use std::io;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "Abcd@1234";

fn test_config() -> ServerConfig {
    ServerConfig {
        stage: "test".to_string(),
        jwt_secret: SECRET.to_string(),
        metrics_enabled: false,
        ..ServerConfig::default()
    }
}

fn doc(value: Value) -> Document {
    value.as_object().unwrap().clone()
}

/// App over a fresh in-memory store with one registered user.
async fn test_app() -> (Router, ServerState) {
    let state = ServerState::with_store(test_config(), Store::in_memory());
    seed_user(&state).await;
    (build_router(Arc::new(state.clone())), state)
}

async fn seed_user(state: &ServerState) {
    state
        .registered_users()
        .insert_one(doc(json!({ "id": 1, "username": "admin", "password": SECRET })))
        .await
        .unwrap();
}

fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    request(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_token(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut()
        .insert("x-access-token", token.parse().unwrap());
    req
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/auth",
            json!({ "id": 1, "username": "admin", "password": SECRET }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    body["x-access-token"].as_str().unwrap().to_string()
}

async fn count(state: &ServerState, collection: &str) -> usize {
    state
        .store
        .collection(collection)
        .find(&Filter::all())
        .await
        .unwrap()
        .len()
}

#[derive(Default)]
struct RecordingLog(Mutex<Vec<AccessEntry>>);

impl AccessLog for RecordingLog {
    fn record(&self, entry: &AccessEntry) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_product_creation_requires_token() {
    let (app, state) = test_app().await;

    let response = app
        .oneshot(json_request(Method::POST, "/products", json!({ "name": "Coffee" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_NO_TOKEN");
    assert_eq!(body["error"]["message"], "No token was found on request headers.");
    assert_eq!(count(&state, "products").await, 0);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (app, _) = test_app().await;

    let req = with_token(request(Method::GET, "/products").body(Body::empty()).unwrap(), "not.a.jwt");
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INVALID_TOKEN");
    assert_eq!(body["error"]["status"], 401);
}

#[tokio::test]
async fn test_login_issues_usable_token() {
    let (app, _) = test_app().await;
    let token = login(&app).await;
    assert!(!token.is_empty());

    let req = with_token(request(Method::GET, "/products").body(Body::empty()).unwrap(), &token);
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!([]));

    let req = request(Method::GET, "/products")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = test_app().await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/auth",
            json!({ "id": 1, "username": "admin", "password": "nope" }),
        ))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(json_request(
            Method::POST,
            "/auth",
            json!({ "id": 7, "username": "ghost", "password": SECRET }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a = response_json(wrong_password).await;
    let b = response_json(unknown_user).await;
    assert_eq!(a, b);
    assert_eq!(a["error"]["code"], "ACCESS_UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_product_is_rejected() {
    let (app, state) = test_app().await;
    let token = login(&app).await;

    let create = || {
        with_token(
            json_request(Method::POST, "/products", json!({ "name": "Coffee", "category": "Drinks" })),
            &token,
        )
    };

    let first = app.clone().oneshot(create()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(create()).await.unwrap();
    assert_eq!(second.status(), StatusCode::PRECONDITION_FAILED);
    let body = response_json(second).await;
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");
    assert_eq!(count(&state, "products").await, 1);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let (app, state) = test_app().await;
    let registration = || json_request(Method::POST, "/registerUser", json!({ "username": "maria", "password": "pw" }));

    let first = app.clone().oneshot(registration()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(registration()).await.unwrap();
    assert_eq!(second.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(count(&state, "registerUser").await, 2);
}

#[tokio::test]
async fn test_registered_users_listing_hides_passwords() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let req = with_token(request(Method::GET, "/registerUser").body(Body::empty()).unwrap(), &token);
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let users = response_json(response).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "admin");
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn test_log_runs_before_authentication() {
    let sink = Arc::new(RecordingLog::default());
    let state = ServerState::with_access_log(test_config(), Store::in_memory(), sink.clone());
    let app = build_router(Arc::new(state));

    let response = app
        .oneshot(request(Method::GET, "/categories").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let entries = sink.0.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, "GET");
    assert_eq!(entries[0].route, "/categories");
}

#[tokio::test]
async fn test_open_routes_are_not_logged() {
    let sink = Arc::new(RecordingLog::default());
    let state = ServerState::with_access_log(test_config(), Store::in_memory(), sink.clone());
    let app = build_router(Arc::new(state));

    let response = app
        .oneshot(request(Method::GET, "/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_product_lookup_by_id() {
    let (app, state) = test_app().await;
    let id = state
        .products()
        .insert_one(doc(json!({ "name": "Tea" })))
        .await
        .unwrap();

    let uri = format!("/products/{id}");
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, &uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["name"], "Tea");
        assert_eq!(body["_id"], id.to_hex());
    }

    let response = app
        .oneshot(request(Method::GET, "/products/not-an-id").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_update_and_delete() {
    let (app, state) = test_app().await;
    let token = login(&app).await;
    let id = state
        .products()
        .insert_one(doc(json!({ "name": "Tea", "price": 3 })))
        .await
        .unwrap();
    let uri = format!("/products/{id}");

    let update = with_token(json_request(Method::PUT, &uri, json!({ "price": 4 })), &token);
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = state.products().find_one(&Filter::by_id(id)).await.unwrap().unwrap();
    assert_eq!(stored.get("price"), Some(&json!(4)));
    assert_eq!(stored.get("name"), Some(&json!("Tea")));

    let delete = with_token(request(Method::DELETE, &uri).body(Body::empty()).unwrap(), &token);
    let response = app.oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(count(&state, "products").await, 0);
}

#[tokio::test]
async fn test_category_products_match_by_name() {
    let (app, state) = test_app().await;
    let drinks = state
        .categories()
        .insert_one(doc(json!({ "name": "Drinks", "img_url": "drinks.png" })))
        .await
        .unwrap();
    let products = state.products();
    products.insert_one(doc(json!({ "name": "Coffee", "category": "Drinks" }))).await.unwrap();
    products.insert_one(doc(json!({ "name": "Bread", "category": "Bakery" }))).await.unwrap();

    let response = app
        .oneshot(
            request(Method::GET, &format!("/categories/{drinks}/products"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, vec![json!("Coffee")]);
}

#[tokio::test]
async fn test_category_creation_validates_payload() {
    let (app, state) = test_app().await;
    let token = login(&app).await;

    let missing_img = with_token(json_request(Method::POST, "/categories", json!({ "name": "Drinks" })), &token);
    let response = app.clone().oneshot(missing_img).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"]["code"], "BAD_REQUEST");

    let valid = with_token(
        json_request(Method::POST, "/categories", json!({ "name": "Drinks", "img_url": "d.png" })),
        &token,
    );
    let response = app.oneshot(valid).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(count(&state, "categories").await, 1);
}

#[tokio::test]
async fn test_register_writes_users_collection() {
    let (app, state) = test_app().await;

    let response = app
        .oneshot(json_request(Method::POST, "/register", json!({ "username": "joao", "password": "pw" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(count(&state, "users").await, 1);
    assert_eq!(count(&state, "registerUser").await, 1);
}

#[tokio::test]
async fn test_unknown_route_returns_envelope() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(request(Method::GET, "/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(request(Method::GET, "/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(
            request(Method::GET, "/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_non_bearer_authorization_falls_back_to_access_token() {
    let (app, _) = test_app().await;
    let token = login(&app).await;

    let req = request(Method::GET, "/products")
        .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
        .header("x-access-token", token)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_bodies_are_413_on_every_route() {
    let (app, state) = test_app().await;
    let token = login(&app).await;
    let huge = "x".repeat(2 * 1024 * 1024);

    let guarded = with_token(
        json_request(Method::POST, "/products", json!({ "name": huge })),
        &token,
    );
    let response = app.clone().oneshot(guarded).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response_json(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(count(&state, "products").await, 0);

    let unguarded = json_request(Method::POST, "/register", json!({ "username": huge, "password": "pw" }));
    let response = app.oneshot(unguarded).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(count(&state, "users").await, 0);
}

/// Shared buffer the JSON log formatter writes into.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

#[tokio::test]
async fn test_request_logs_carry_request_id() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .json()
        .flatten_event(true)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (app, _) = test_app().await;
    let response = app
        .oneshot(
            request(Method::GET, "/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_lines: Vec<Value> = logs
        .lines()
        .into_iter()
        .filter(|line| {
            matches!(
                line["message"].as_str(),
                Some("Request started") | Some("Request completed")
            )
        })
        .collect();

    assert_eq!(request_lines.len(), 2);
    for line in request_lines {
        assert_eq!(line["request_id"], "req-42");
    }
}
