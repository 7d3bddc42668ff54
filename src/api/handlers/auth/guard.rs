//! Bearer-token guards for manager- and user-scoped routes.

use crate::auth::{AuthError, AuthFlow, Manager, Tier, TokenScope, User};
use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Pull the token out of an `Authorization: Bearer ...` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authorize a manager request at the given tier.
///
/// The manager record is re-fetched by the token's `sub` claim rather than
/// trusting the role embedded at issuance, so a role downgrade takes effect
/// before the token expires.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] when the header is missing or
/// malformed, [`AuthError::InvalidToken`] for bad tokens, user-scoped
/// tokens, and deleted accounts, and [`AuthError::Forbidden`] when the role
/// does not clear the tier.
pub async fn require_tier(
    flow: &AuthFlow,
    headers: &HeaderMap,
    tier: Tier,
) -> Result<Manager, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthorized)?;

    let claims = flow.tokens().decode(token)?;
    if claims.scope != TokenScope::Manager {
        return Err(AuthError::InvalidToken);
    }

    let manager = flow
        .store()
        .find_manager_by_id(claims.sub)
        .await
        .map_err(AuthError::store)?
        .ok_or(AuthError::InvalidToken)?;

    if !manager.role.satisfies(tier) {
        tracing::warn!(
            manager_id = %manager.id,
            role = %manager.role,
            "manager lacks required tier"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(manager)
}

/// Authorize a user-scoped request.
///
/// Like [`require_tier`], the account is re-fetched by the token's `sub`
/// claim, so a deleted user loses access immediately even with a live token.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] when the header is missing or
/// malformed, [`AuthError::InvalidToken`] for bad tokens, manager-scoped
/// tokens, and deleted accounts.
pub async fn require_user(flow: &AuthFlow, headers: &HeaderMap) -> Result<User, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthorized)?;

    let claims = flow.tokens().decode(token)?;
    if claims.scope != TokenScope::User {
        return Err(AuthError::InvalidToken);
    }

    flow.store()
        .find_user_by_id(claims.sub)
        .await
        .map_err(AuthError::store)?
        .ok_or(AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, IdentityStore, Role};
    use crate::notify::LogNotifier;
    use crate::store::MemoryIdentityStore;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use secrecy::SecretString;
    use std::sync::Arc;
    use uuid::Uuid;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    async fn flow_with_manager(role: Role) -> (AuthFlow, Uuid) {
        let store = Arc::new(MemoryIdentityStore::new());
        let id = Uuid::new_v4();
        let now = Utc::now();
        store
            .insert_manager(Manager {
                id,
                username: "ops-lead".to_string(),
                phone_number: "+15555550111".to_string(),
                password_hash: Some("$argon2id$fake".to_string()),
                role,
                created_at: now,
                updated_at: now,
            })
            .await;

        let flow = AuthFlow::new(
            store,
            Arc::new(LogNotifier),
            SecretString::from("test-secret"),
            AuthConfig::default(),
        );
        (flow, id)
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("abc")), Some("abc"));

        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let (flow, _) = flow_with_manager(Role::Manager).await;
        let result = require_tier(&flow, &HeaderMap::new(), Tier::Monitor).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_user_token_cannot_open_manager_routes() {
        let (flow, _) = flow_with_manager(Role::Manager).await;
        let token = flow
            .tokens()
            .issue_user_token(Uuid::new_v4(), "jane@example.com")
            .unwrap();

        let result = require_tier(&flow, &bearer(&token), Tier::Monitor).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_monitor_role_clears_monitor_tier_only() {
        let (flow, id) = flow_with_manager(Role::Monitor).await;
        let token = flow.tokens().issue_manager_token(id, "ops-lead").unwrap();

        assert!(require_tier(&flow, &bearer(&token), Tier::Monitor)
            .await
            .is_ok());
        assert!(matches!(
            require_tier(&flow, &bearer(&token), Tier::Director).await,
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            require_tier(&flow, &bearer(&token), Tier::Manager).await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_user_guard_accepts_only_live_user_tokens() {
        use crate::auth::NewUser;

        let store = Arc::new(MemoryIdentityStore::new());
        let flow = AuthFlow::new(
            store.clone(),
            Arc::new(LogNotifier),
            SecretString::from("test-secret"),
            AuthConfig::default(),
        );
        let user = flow
            .signup_user(NewUser {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone_number: "+15555550100".to_string(),
                password: SecretString::from("hunter22hunter22"),
            })
            .await
            .unwrap();
        let token = flow
            .tokens()
            .issue_user_token(user.id, &user.email)
            .unwrap();

        let authorized = require_user(&flow, &bearer(&token)).await.unwrap();
        assert_eq!(authorized.id, user.id);
        assert!(authorized.password_hash.is_none());

        // A manager-scoped token is not a user token
        let manager_token = flow.tokens().issue_manager_token(user.id, "ops").unwrap();
        assert!(matches!(
            require_user(&flow, &bearer(&manager_token)).await,
            Err(AuthError::InvalidToken)
        ));

        assert!(matches!(
            require_user(&flow, &HeaderMap::new()).await,
            Err(AuthError::Unauthorized)
        ));

        // Deleting the account kills the live token
        store.delete_user(user.id).await.unwrap();
        assert!(matches!(
            require_user(&flow, &bearer(&token)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_deleted_manager_is_rejected() {
        let (flow, _) = flow_with_manager(Role::Manager).await;
        // Token for an id the store has never seen
        let token = flow
            .tokens()
            .issue_manager_token(Uuid::new_v4(), "ghost")
            .unwrap();

        let result = require_tier(&flow, &bearer(&token), Tier::Monitor).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
