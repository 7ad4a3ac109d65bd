use dositio::store::BackendConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Secret used when none is configured outside production.
const DEV_JWT_SECRET: &str = "dositio-development-secret-change-me";

/// Where records are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    Mongo,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Deployment stage (`dev`, `test`, `production`)
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC secret for identity tokens
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Document store connection string
    #[serde(default = "default_db_url")]
    pub db_url: String,

    /// Persistence backend
    #[serde(default)]
    pub storage: StorageKind,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            bind_addr: default_bind_addr(),
            port: default_port(),
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            db_url: default_db_url(),
            storage: StorageKind::default(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server` config file and
    /// `DOSITIO__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("DOSITIO").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.finalize()
    }

    /// Apply defaults that depend on other fields and reject unusable settings.
    pub fn finalize(mut self) -> anyhow::Result<Self> {
        if self.jwt_secret.is_empty() {
            if self.is_production() {
                anyhow::bail!("jwt_secret must be set in production");
            }
            self.jwt_secret = DEV_JWT_SECRET.to_string();
        }
        if self.token_ttl_secs == 0 {
            anyhow::bail!("token_ttl_secs must be greater than zero");
        }
        Ok(self)
    }

    /// Whether `finalize` fell back to the built-in development secret.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn is_production(&self) -> bool {
        self.stage.eq_ignore_ascii_case("production")
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn backend(&self) -> BackendConfig {
        match self.storage {
            StorageKind::Memory => BackendConfig::in_memory(),
            StorageKind::Mongo => BackendConfig::mongo(self.db_url.clone()),
        }
    }
}

fn default_stage() -> String {
    "dev".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_db_url() -> String {
    "mongodb://localhost:27017/dositio".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
