use super::{Guard, GuardResult};
use crate::context::RequestContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One access-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    pub method: String,
    pub route: String,
    pub timestamp: DateTime<Utc>,
    pub username: Option<String>,
}

/// Destination for access-log entries.
pub trait AccessLog: Send + Sync {
    fn record(&self, entry: &AccessEntry) -> anyhow::Result<()>;
}

/// Writes entries as structured `tracing` events under `dositio::access`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, entry: &AccessEntry) -> anyhow::Result<()> {
        tracing::info!(
            target: "dositio::access",
            method = %entry.method,
            route = %entry.route,
            timestamp = %entry.timestamp.to_rfc3339(),
            username = entry.username.as_deref().unwrap_or("-"),
            "route accessed"
        );
        Ok(())
    }
}

/// Records that a route was hit. Never rejects.
pub struct Log {
    sink: Arc<dyn AccessLog>,
}

impl Log {
    pub fn new(sink: Arc<dyn AccessLog>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Guard for Log {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn check(&self, ctx: &mut RequestContext) -> GuardResult {
        let entry = AccessEntry {
            method: ctx.method.to_string(),
            route: ctx.route.clone(),
            timestamp: Utc::now(),
            username: ctx.identity.as_ref().map(|i| i.username.clone()),
        };
        if let Err(err) = self.sink.record(&entry) {
            tracing::warn!(route = %ctx.route, error = %err, "access log write failed");
        }
        GuardResult::Proceed
    }
}
