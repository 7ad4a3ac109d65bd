//! Route guard composition.
//!
//! [`compose_route`] turns a [`RouteDescriptor`] into the ordered
//! [`GuardChain`] for that route. It runs once per route while the server is
//! being assembled, so a route's guards cannot change between requests.
//!
//! The chain has two phases:
//!
//! 1. **early** - generic identity and logging concerns, in the order
//!    `Log`, `Authenticate`, so failed authentication attempts still leave
//!    an access-log entry;
//! 2. **pre-handler** - resource-specific checks, which may rely on the
//!    identity the early phase established.
//!
//! At request time [`GuardChain::run`] executes the early phase in full and
//! then the pre-handler phase, stopping at the first rejection.

use crate::context::RequestContext;
use crate::error::GuardError;
use crate::guard::{GuardResult, GuardSet};
use crate::policy::RouteDescriptor;
use std::fmt;

/// The guards a chain may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKind {
    Log,
    Authenticate,
    RejectIfExists,
    RejectIfDuplicateUser,
}

impl GuardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardKind::Log => "log",
            GuardKind::Authenticate => "authenticate",
            GuardKind::RejectIfExists => "reject_if_exists",
            GuardKind::RejectIfDuplicateUser => "reject_if_duplicate_user",
        }
    }

    /// Whether the guard reads the request payload.
    pub fn reads_body(self) -> bool {
        matches!(
            self,
            GuardKind::RejectIfExists | GuardKind::RejectIfDuplicateUser
        )
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered guards bound to one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain {
    pub early: Vec<GuardKind>,
    pub pre_handler: Vec<GuardKind>,
}

/// Result of running a whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    Proceed,
    Rejected { guard: GuardKind, error: GuardError },
}

impl GuardChain {
    pub fn is_empty(&self) -> bool {
        self.early.is_empty() && self.pre_handler.is_empty()
    }

    /// All guards in execution order.
    pub fn iter(&self) -> impl Iterator<Item = GuardKind> + '_ {
        self.early.iter().chain(self.pre_handler.iter()).copied()
    }

    pub fn needs_body(&self) -> bool {
        self.iter().any(GuardKind::reads_body)
    }

    /// Run every guard in order against `ctx`, stopping at the first rejection.
    pub async fn run(&self, guards: &GuardSet, ctx: &mut RequestContext) -> ChainOutcome {
        for kind in self.iter() {
            match guards.resolve(kind).check(ctx).await {
                GuardResult::Proceed => {}
                GuardResult::Reject(error) => {
                    metrics::counter!(
                        "dositio_guard_rejections_total",
                        "guard" => kind.as_str(),
                        "code" => error.code()
                    )
                    .increment(1);
                    tracing::debug!(
                        method = %ctx.method,
                        route = %ctx.route,
                        guard = %kind,
                        code = error.code(),
                        "request rejected by guard"
                    );
                    return ChainOutcome::Rejected { guard: kind, error };
                }
            }
        }
        ChainOutcome::Proceed
    }
}

impl fmt::Display for GuardChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |kinds: &[GuardKind]| {
            kinds
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "early=[{}] pre_handler=[{}]",
            join(&self.early),
            join(&self.pre_handler)
        )
    }
}

/// Build the guard chain for one route from its declared policy.
///
/// Never fails and depends on nothing but `route`.
pub fn compose_route(route: &RouteDescriptor) -> GuardChain {
    let policy = route.effective_policy();
    let mut chain = GuardChain::default();

    if policy.log_me {
        chain.early.push(GuardKind::Log);
    }
    if policy.require_authentication {
        chain.early.push(GuardKind::Authenticate);
    }
    if route.is_product_creation() {
        chain.pre_handler.push(GuardKind::RejectIfExists);
    }
    if route.is_user_registration() {
        chain.pre_handler.push(GuardKind::RejectIfDuplicateUser);
    }

    tracing::debug!(route = %route, chain = %chain, "composed guard chain");
    chain
}

/// Compose every route of a routing table, preserving table order.
pub fn compose_routes(routes: &[RouteDescriptor]) -> Vec<(RouteDescriptor, GuardChain)> {
    routes
        .iter()
        .map(|route| (route.clone(), compose_route(route)))
        .collect()
}
