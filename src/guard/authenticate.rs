use super::{Guard, GuardResult};
use crate::context::RequestContext;
use crate::error::GuardError;
use crate::token::TokenService;
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use std::sync::Arc;

/// Header the login route hands the token back under; accepted as an
/// alternative to `Authorization: Bearer`.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Maximum accepted token size; anything larger is treated as invalid.
const MAX_TOKEN_SIZE: usize = 8 * 1024;

/// Verifies the bearer credential and attaches the decoded identity.
pub struct Authenticate {
    tokens: Arc<TokenService>,
}

impl Authenticate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    (!raw.is_empty()).then_some(raw)
}

/// Credential of an `Authorization: Bearer` header. Other schemes yield nothing.
fn bearer(value: &str) -> Option<&str> {
    let (scheme, credential) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    non_empty(credential)
}

fn extract_token(ctx: &RequestContext) -> Option<&str> {
    ctx.header(AUTHORIZATION.as_str())
        .and_then(bearer)
        .or_else(|| ctx.header(ACCESS_TOKEN_HEADER).and_then(non_empty))
}

#[async_trait]
impl Guard for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn check(&self, ctx: &mut RequestContext) -> GuardResult {
        let Some(token) = extract_token(ctx) else {
            return GuardError::no_token().into();
        };
        if token.len() > MAX_TOKEN_SIZE {
            return GuardError::invalid_token().into();
        }

        match self.tokens.verify(token) {
            Ok(identity) => {
                ctx.identity = Some(identity);
                GuardResult::Proceed
            }
            Err(err) => {
                tracing::debug!(route = %ctx.route, error = %err, "rejecting token");
                GuardError::invalid_token().into()
            }
        }
    }
}
