use crate::error::ServerError;
use crate::state::ServerState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dositio::{ChainOutcome, GuardChain, RequestContext, RouteDescriptor};
use http_body_util::LengthLimitError;
use std::sync::Arc;

/// A route's composed guard chain, bound together with the shared state the
/// guards run against.
#[derive(Clone)]
pub struct GuardedRoute {
    pub state: Arc<ServerState>,
    pub descriptor: Arc<RouteDescriptor>,
    pub chain: Arc<GuardChain>,
}

/// Guard enforcement middleware
///
/// Runs the route's chain before the handler. A rejection is answered here
/// and the handler never runs. On success the identity established by the
/// chain is available to the handler as an `Extension<Identity>`.
pub async fn enforce_guards(
    State(route): State<GuardedRoute>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::new(
        parts.method.clone(),
        route.descriptor.path.clone(),
        parts.headers.clone(),
    );

    // Only resource checks look at the payload; other chains stream it through.
    let body = if route.chain.needs_body() {
        let limit = route.state.config.max_body_size();
        let bytes = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes,
            Err(err) if exceeds_limit(&err) => return ServerError::PayloadTooLarge.into_response(),
            Err(_) => {
                return ServerError::BadRequest("Request body could not be read".to_string())
                    .into_response()
            }
        };
        ctx.body = serde_json::from_slice(&bytes).ok();
        Body::from(bytes)
    } else {
        body
    };

    match route.chain.run(&route.state.guards, &mut ctx).await {
        ChainOutcome::Rejected { error, .. } => ServerError::Guard(error).into_response(),
        ChainOutcome::Proceed => {
            let mut request = Request::from_parts(parts, body);
            if let Some(identity) = ctx.identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
    }
}

/// Whether a body read failed because the length limit was hit.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Add to request extensions for handlers to access
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Request identifier stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    metrics::counter!(
        "dositio_http_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
