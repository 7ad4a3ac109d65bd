use crate::config::ServerConfig;
use crate::error::ServerResult;
use dositio::collections;
use dositio::store::{Collection, Store};
use dositio::{AccessLog, GuardSet, TokenService, TracingAccessLog};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Document store (shared across requests)
    pub store: Store,

    /// Token issuer/verifier
    pub tokens: Arc<TokenService>,

    /// Guard instances referenced by every route's chain
    pub guards: GuardSet,

    /// Prometheus handle, present when a recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state, opening the configured backend
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = Store::open(&config.backend()).await?;
        Ok(Self::with_store(config, store))
    }

    /// Build state over an already opened store
    pub fn with_store(config: ServerConfig, store: Store) -> Self {
        Self::with_access_log(config, store, Arc::new(TracingAccessLog))
    }

    /// Build state with a custom access-log sink
    pub fn with_access_log(
        config: ServerConfig,
        store: Store,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl(),
        ));
        let guards = GuardSet::new(
            tokens.clone(),
            store.collection(collections::PRODUCTS),
            store.collection(collections::REGISTERED_USERS),
            access_log,
        );

        Self {
            config: Arc::new(config),
            store,
            tokens,
            guards,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn products(&self) -> Arc<dyn Collection> {
        self.store.collection(collections::PRODUCTS)
    }

    pub fn categories(&self) -> Arc<dyn Collection> {
        self.store.collection(collections::CATEGORIES)
    }

    pub fn registered_users(&self) -> Arc<dyn Collection> {
        self.store.collection(collections::REGISTERED_USERS)
    }

    pub fn users(&self) -> Arc<dyn Collection> {
        self.store.collection(collections::USERS)
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
