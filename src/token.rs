//! Signed, stateless identity tokens (HS256 JWT).
//!
//! Nothing about an issued token is stored server-side: verification only
//! needs the shared secret.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The authenticated caller, as carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Encoding(String),
}

/// Issues and verifies identity tokens with a shared HMAC secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, identity: &Identity) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| TokenError::Encoding("token lifetime out of range".to_string()))?;
        let claims = Claims {
            identity: identity.clone(),
            iat: now,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("token verification failed: {:?}", e);
            match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;
        Ok(data.claims.identity)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub const TEST_SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

    /// A token whose `exp` lies in the past, signed with `secret`.
    pub fn expired_token(identity: &Identity, secret: &[u8]) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            identity: identity.clone(),
            iat: now - 7200,
            exp: now - 3600,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to encode test JWT")
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{expired_token, TEST_SECRET};
    use super::*;

    fn alice() -> Identity {
        Identity {
            id: 1,
            username: "alice".into(),
        }
    }

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET, Duration::from_secs(3600))
    }

    #[test]
    fn signed_token_verifies_to_same_identity() {
        let svc = service();
        let token = svc.sign(&alice()).unwrap();
        assert!(!token.is_empty());
        assert_eq!(svc.verify(&token).unwrap(), alice());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenService::new(b"different-secret-key-32-bytes!!!", Duration::from_secs(60));
        let token = other.sign(&alice()).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = expired_token(&alice(), TEST_SECRET);
        assert!(matches!(service().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            service().verify("not-a-jwt"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn claims_have_no_password_slot() {
        let token = service().sign(&alice()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        assert!(!payload.is_empty());
        // identity is the only application data in the claims
        let value = serde_json::to_value(Claims {
            identity: alice(),
            iat: 0,
            exp: 1,
        })
        .unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert!(!keys.contains(&"password".to_string()));
    }

    #[test]
    fn oversized_ttl_fails_to_sign() {
        let svc = TokenService::new(TEST_SECRET, Duration::from_secs(u64::MAX));
        assert!(matches!(svc.sign(&alice()), Err(TokenError::Encoding(_))));

        let svc = TokenService::new(TEST_SECRET, Duration::from_secs(i64::MAX as u64));
        assert!(matches!(svc.sign(&alice()), Err(TokenError::Encoding(_))));
    }
}
