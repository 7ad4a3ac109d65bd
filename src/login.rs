//! Credential login.
//!
//! Every failure, whether the user is unknown, the password is wrong, or
//! something broke underneath, is reported as the same `Unauthorized` error
//! so the response never reveals which part of the credentials was wrong.

use crate::error::GuardError;
use crate::token::{Identity, TokenService};
use serde::{Deserialize, Serialize};
use store::{Collection, Filter, Record};
use subtle::ConstantTimeEq;

/// Field holding a registered user's secret.
pub const PASSWORD_KEY: &str = "password";

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginToken {
    #[serde(rename = "x-access-token")]
    pub token: String,
}

fn password_matches(record: &Record, supplied: &str) -> bool {
    record
        .get(PASSWORD_KEY)
        .and_then(|v| v.as_str())
        .map(|stored| bool::from(stored.as_bytes().ct_eq(supplied.as_bytes())))
        .unwrap_or(false)
}

/// Identity of a stored user record, with the secret left behind.
fn identity_of(record: Record) -> Option<Identity> {
    let public = record.without(PASSWORD_KEY);
    Some(Identity {
        id: public.get("id")?.as_i64()?,
        username: public.get("username")?.as_str()?.to_string(),
    })
}

/// Verify `credentials` against `users` and issue a token.
pub async fn login(
    users: &dyn Collection,
    tokens: &TokenService,
    credentials: &Credentials,
) -> Result<LoginToken, GuardError> {
    let filter = Filter::all()
        .eq("id", credentials.id)
        .eq("username", credentials.username.as_str());

    let record = match users.find_one(&filter).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(GuardError::unauthorized()),
        Err(err) => {
            tracing::error!(error = %err, "user lookup failed during login");
            return Err(GuardError::unauthorized());
        }
    };

    if !password_matches(&record, &credentials.password) {
        return Err(GuardError::unauthorized());
    }

    let identity = identity_of(record).ok_or_else(GuardError::unauthorized)?;
    let token = tokens.sign(&identity).map_err(|err| {
        tracing::error!(error = %err, "token signing failed");
        GuardError::unauthorized()
    })?;

    tracing::info!(username = %identity.username, "login");
    Ok(LoginToken { token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::token::test_utils::TEST_SECRET;
    use serde_json::json;
    use std::time::Duration;
    use store::InMemoryCollection;

    async fn users() -> InMemoryCollection {
        let users = InMemoryCollection::new("registerUser");
        users
            .insert_one(
                json!({ "id": 1, "username": "alice", "password": "correct" })
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await
            .unwrap();
        users
    }

    fn tokens() -> TokenService {
        TokenService::new(TEST_SECRET, Duration::from_secs(600))
    }

    fn creds(id: i64, username: &str, password: &str) -> Credentials {
        Credentials {
            id,
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn correct_credentials_issue_verifiable_token() {
        let svc = tokens();
        let out = login(&users().await, &svc, &creds(1, "alice", "correct"))
            .await
            .unwrap();

        assert!(!out.token.is_empty());
        let identity = svc.verify(&out.token).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.id, 1);

        let body = serde_json::to_value(&out).unwrap();
        assert!(body.get("x-access-token").is_some());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let coll = users().await;
        let svc = tokens();

        let wrong_password = login(&coll, &svc, &creds(1, "alice", "nope")).await.unwrap_err();
        let unknown_user = login(&coll, &svc, &creds(2, "mallory", "correct"))
            .await
            .unwrap_err();
        let wrong_id = login(&coll, &svc, &creds(9, "alice", "correct")).await.unwrap_err();

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password, wrong_id);
        assert_eq!(wrong_password.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn record_without_password_never_logs_in() {
        let coll = InMemoryCollection::new("registerUser");
        coll.insert_one(json!({ "id": 3, "username": "nopw" }).as_object().unwrap().clone())
            .await
            .unwrap();
        let err = login(&coll, &tokens(), &creds(3, "nopw", "")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
