use super::{Guard, GuardResult};
use crate::context::RequestContext;
use crate::error::GuardError;
use async_trait::async_trait;
use std::sync::Arc;
use store::{Collection, Filter};

/// Uniqueness key of a registered user. The registration write stores the
/// payload under the same field, so check and write agree on the key.
pub const USERNAME_KEY: &str = "username";

/// Rejects self-registration when the username is already taken.
pub struct RejectIfDuplicateUser {
    users: Arc<dyn Collection>,
}

impl RejectIfDuplicateUser {
    pub fn new(users: Arc<dyn Collection>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Guard for RejectIfDuplicateUser {
    fn name(&self) -> &'static str {
        "reject_if_duplicate_user"
    }

    async fn check(&self, ctx: &mut RequestContext) -> GuardResult {
        let Some(username) = ctx.body_str(USERNAME_KEY) else {
            return GuardResult::Proceed;
        };

        match self
            .users
            .find_one(&Filter::all().eq(USERNAME_KEY, username))
            .await
        {
            Ok(Some(_)) => {
                tracing::info!(username, "registration rejected, username taken");
                GuardError::already_exists().into()
            }
            Ok(None) => GuardResult::Proceed,
            Err(err) => {
                tracing::error!(collection = self.users.name(), error = %err, "uniqueness check failed");
                GuardError::internal().into()
            }
        }
    }
}
