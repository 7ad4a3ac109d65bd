//! dositio server - HTTP REST API for the dositio product catalog
//!
//! This crate exposes the catalog (products, categories, user registration)
//! over HTTP. Every route declares an access policy in the routing table;
//! at startup the policy is composed into a guard chain that runs in front
//! of the route's handler:
//!
//! - **Access logging**: routes flagged `log_me` record an access entry
//! - **Authentication**: routes flagged `require_authentication` need a
//!   valid token in `x-access-token` or `Authorization: Bearer`
//! - **Resource checks**: `POST /products` and `POST /registerUser` refuse
//!   duplicates with `412 ALREADY_EXISTS`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Prometheus metrics
//! - `POST /auth` - Exchange credentials for a token
//! - `GET /products/{id}`, `GET /categories/{id}`, `GET /categories/{id}/products`
//! - `POST /registerUser`, `POST /register`
//!
//! ## Protected Endpoints (Token Required)
//!
//! - `GET /products`, `POST /products`
//! - `PUT /products/{id}`, `DELETE /products/{id}`
//! - `GET /categories` (access logged), `POST /categories`
//! - `PUT /categories/{id}`, `DELETE /categories/{id}`
//! - `GET /registerUser` (access logged)

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StorageKind};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
