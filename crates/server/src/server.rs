//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration from the routing table
//! - Per-route guard chains composed from each route's declared policy
//! - Global middleware stack (logging, request IDs, compression, etc.)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{enforce_guards, log_requests, request_id, GuardedRoute};
use crate::routes::{not_found, route_table, RouteSpec};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use dositio::{compose_routes, RouteDescriptor};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Every route in the routing table gets its guard chain composed exactly
/// once, here. Routes whose chain is empty are registered as-is; all others
/// are wrapped in [`enforce_guards`] bound to their own chain.
///
/// Middleware stack (applied in reverse order):
/// 1. Request tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Body size limit
/// 8. Route guards (per route)
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let table = route_table();
    let descriptors: Vec<RouteDescriptor> =
        table.iter().map(|spec| spec.descriptor.clone()).collect();
    let composed = compose_routes(&descriptors);

    let mut router = Router::new();
    for (RouteSpec { handler, .. }, (descriptor, chain)) in table.into_iter().zip(composed) {
        tracing::debug!(route = %descriptor, chain = %chain, "registering route");

        let path = descriptor.path.clone();
        let handler = if chain.is_empty() {
            handler
        } else {
            let guarded = GuardedRoute {
                state: state.clone(),
                descriptor: Arc::new(descriptor),
                chain: Arc::new(chain),
            };
            handler.route_layer(from_fn_with_state(guarded, enforce_guards))
        };
        router = router.route(&path, handler);
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the dositio HTTP server
///
/// Initializes the server with the provided configuration and starts listening
/// for incoming HTTP requests. This function will block until the server is
/// shut down via SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// # Initialization
///
/// 1. Sets up structured JSON logging with the configured log level
/// 2. Installs the Prometheus recorder when metrics are enabled
/// 3. Opens the configured store and creates shared server state
/// 4. Builds the Axum router, composing every route's guard chain
/// 5. Binds to the configured TCP address and serves until shutdown
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    if config.uses_development_secret() {
        tracing::warn!("No jwt_secret configured, using the development secret");
    }

    // Create server state
    let mut state = ServerState::new(config.clone()).await?;
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }

    // Build router
    let app = build_router(Arc::new(state));

    // Parse bind address
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting dositio server on {} (stage: {}, storage: {:?})",
        addr,
        config.stage,
        config.storage
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, Token TTL: {}s",
        config.timeout_secs,
        config.max_body_size_mb,
        config.token_ttl_secs
    );
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
