use crate::token::Identity;
use http::{HeaderMap, Method};
use serde_json::Value;

/// What a guard may see and change about an in-flight request.
///
/// Built once per request by the HTTP layer. `body` is only populated for
/// chains that inspect the payload.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Route template the request matched, e.g. `/products/{id}`.
    pub route: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Set by the authentication guard; read by later guards and handlers.
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn new(method: Method, route: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            route: route.into(),
            headers,
            body: None,
            identity: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// String field of the JSON payload, if the payload is an object holding one.
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }
}
