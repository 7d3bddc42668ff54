//! Bearer token issuance and validation (HS256).

use crate::auth::error::AuthError;
use anyhow::anyhow;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which audience a token was minted for. User tokens never open manager
/// endpoints and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    User,
    Manager,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub scope: TokenScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and validates tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    user_ttl: Duration,
    manager_ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("user_ttl", &self.user_ttl)
            .field("manager_ttl", &self.manager_ttl)
            .finish()
    }
}

impl TokenIssuer {
    #[must_use]
    pub const fn new(secret: SecretString, user_ttl: Duration, manager_ttl: Duration) -> Self {
        Self {
            secret,
            user_ttl,
            manager_ttl,
        }
    }

    /// Mint a long-lived session token for a verified user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_user_token(&self, id: Uuid, email: &str) -> Result<String, AuthError> {
        self.sign(TokenClaims {
            sub: id,
            scope: TokenScope::User,
            email: Some(email.to_string()),
            username: None,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + self.user_ttl).timestamp(),
        })
    }

    /// Mint a short-lived session token for a manager.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_manager_token(&self, id: Uuid, username: &str) -> Result<String, AuthError> {
        self.sign(TokenClaims {
            sub: id,
            scope: TokenScope::Manager,
            email: None,
            username: Some(username.to_string()),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + self.manager_ttl).timestamp(),
        })
    }

    fn sign(&self, claims: TokenClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|err| AuthError::store(anyhow!("failed to sign token: {err}")))
    }

    /// Validate signature and expiry. Any failure collapses into
    /// [`AuthError::InvalidToken`]; callers get no hint why a token was bad.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is malformed, has a
    /// bad signature, or is expired.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            SecretString::from("test-secret"),
            Duration::days(30),
            Duration::hours(12),
        )
    }

    #[test]
    fn test_user_token_round_trip() -> Result<(), AuthError> {
        let issuer = issuer();
        let id = Uuid::new_v4();

        let token = issuer.issue_user_token(id, "jane@example.com")?;
        let claims = issuer.decode(&token)?;

        assert_eq!(claims.sub, id);
        assert_eq!(claims.scope, TokenScope::User);
        assert_eq!(claims.email.as_deref(), Some("jane@example.com"));
        assert!(claims.username.is_none());
        Ok(())
    }

    #[test]
    fn test_manager_token_carries_username_and_short_expiry() -> Result<(), AuthError> {
        let issuer = issuer();
        let id = Uuid::new_v4();

        let token = issuer.issue_manager_token(id, "ops-lead")?;
        let claims = issuer.decode(&token)?;

        assert_eq!(claims.scope, TokenScope::Manager);
        assert_eq!(claims.username.as_deref(), Some("ops-lead"));

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, Duration::hours(12).num_seconds());
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issuer()
            .issue_user_token(Uuid::new_v4(), "jane@example.com")
            .unwrap();

        let other = TokenIssuer::new(
            SecretString::from("another-secret"),
            Duration::days(30),
            Duration::hours(12),
        );
        assert!(matches!(
            other.decode(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            issuer().decode("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let output = format!("{:?}", issuer());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("test-secret"));
    }
}
