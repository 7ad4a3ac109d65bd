//! Request guards.
//!
//! A guard inspects (and may augment) a [`RequestContext`] and either lets
//! the request continue or terminates it with a [`GuardError`]. Guards never
//! call the handler themselves; the chain executor in [`crate::compose`]
//! decides what runs next.

mod authenticate;
mod log;
mod reject_if_duplicate_user;
mod reject_if_exists;

pub use authenticate::Authenticate;
pub use log::{AccessEntry, AccessLog, Log, TracingAccessLog};
pub use reject_if_duplicate_user::RejectIfDuplicateUser;
pub use reject_if_exists::RejectIfExists;

use crate::compose::GuardKind;
use crate::context::RequestContext;
use crate::error::GuardError;
use crate::token::TokenService;
use async_trait::async_trait;
use std::sync::Arc;
use store::Collection;

/// Outcome of a single guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    Proceed,
    Reject(GuardError),
}

impl GuardResult {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardResult::Proceed)
    }
}

impl From<GuardError> for GuardResult {
    fn from(err: GuardError) -> Self {
        GuardResult::Reject(err)
    }
}

#[async_trait]
pub trait Guard: Send + Sync {
    /// Stable name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    async fn check(&self, ctx: &mut RequestContext) -> GuardResult;
}

/// One instance of every guard, wired to its collaborators.
///
/// Shared by all routes; chains refer to guards by [`GuardKind`].
#[derive(Clone)]
pub struct GuardSet {
    log: Arc<dyn Guard>,
    authenticate: Arc<dyn Guard>,
    reject_if_exists: Arc<dyn Guard>,
    reject_if_duplicate_user: Arc<dyn Guard>,
}

impl GuardSet {
    pub fn new(
        tokens: Arc<TokenService>,
        products: Arc<dyn Collection>,
        registered_users: Arc<dyn Collection>,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            log: Arc::new(Log::new(access_log)),
            authenticate: Arc::new(Authenticate::new(tokens)),
            reject_if_exists: Arc::new(RejectIfExists::new(products)),
            reject_if_duplicate_user: Arc::new(RejectIfDuplicateUser::new(registered_users)),
        }
    }

    pub fn resolve(&self, kind: GuardKind) -> &dyn Guard {
        match kind {
            GuardKind::Log => self.log.as_ref(),
            GuardKind::Authenticate => self.authenticate.as_ref(),
            GuardKind::RejectIfExists => self.reject_if_exists.as_ref(),
            GuardKind::RejectIfDuplicateUser => self.reject_if_duplicate_user.as_ref(),
        }
    }
}

impl std::fmt::Debug for GuardSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardSet").finish_non_exhaustive()
    }
}
