//! End-to-end flow tests over the in-memory store.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use custode::auth::{
    AuthConfig, AuthError, AuthFlow, ConflictKind, CredentialHasher, Manager, NewUser, Role,
    TokenScope,
};
use custode::notify::Notifier;
use custode::store::MemoryIdentityStore;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Captures every (phone, code) pair instead of sending anything.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn last_code(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, code)| code.clone())
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, phone_number: &str, code: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone_number.to_string(), code.to_string()));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _phone_number: &str, _code: &str) -> anyhow::Result<()> {
        Err(anyhow!("gateway down"))
    }
}

fn setup_with(config: AuthConfig) -> (AuthFlow, Arc<MemoryIdentityStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryIdentityStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = AuthFlow::new(
        store.clone(),
        notifier.clone(),
        SecretString::from("integration-secret"),
        config,
    );
    (flow, store, notifier)
}

fn setup() -> (AuthFlow, Arc<MemoryIdentityStore>, Arc<RecordingNotifier>) {
    setup_with(AuthConfig::default())
}

fn jane() -> NewUser {
    NewUser {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone_number: "+15555550100".to_string(),
        password: SecretString::from("hunter22hunter22"),
    }
}

#[tokio::test]
async fn signup_then_verify_issues_a_user_token() {
    let (flow, _store, notifier) = setup();

    let user = flow.signup_user(jane()).await.unwrap();
    assert!(!user.verified);
    assert!(user.password_hash.is_none());
    assert!(user.otp.is_none());

    let code = notifier.last_code().expect("signup sends a code");
    assert_eq!(code.len(), 5);

    let (verified, token) = flow.verify_account(user.id, &code).await.unwrap();
    assert!(verified.verified);

    let claims = flow.tokens().decode(&token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.scope, TokenScope::User);
    assert_eq!(claims.email.as_deref(), Some("jane@example.com"));
}

#[tokio::test]
async fn signup_reports_email_conflict_before_phone() {
    let (flow, _store, _notifier) = setup();
    flow.signup_user(jane()).await.unwrap();

    // Same email and phone: email wins
    let err = flow.signup_user(jane()).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict(ConflictKind::Email)));

    // Fresh email, duplicate phone
    let mut dup_phone = jane();
    dup_phone.email = "other@example.com".to_string();
    let err = flow.signup_user(dup_phone).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict(ConflictKind::Phone)));
}

#[tokio::test]
async fn login_is_gated_on_verification() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let password = SecretString::from("hunter22hunter22");

    let err = flow.login_user("+15555550100", &password).await.unwrap_err();
    assert!(matches!(err, AuthError::NotVerified));

    let code = notifier.last_code().unwrap();
    flow.verify_account(user.id, &code).await.unwrap();

    // The code was consumed; replaying it fails
    let err = flow.verify_account(user.id, &code).await.unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalid));

    let (logged_in, token) = flow.login_user("+15555550100", &password).await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(logged_in.password_hash.is_none());
    assert!(!token.is_empty());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let code = notifier.last_code().unwrap();
    flow.verify_account(user.id, &code).await.unwrap();

    // Unknown phone and wrong password produce the same error
    let err = flow
        .login_user("+15555550199", &SecretString::from("hunter22hunter22"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::WrongCredentials));

    let err = flow
        .login_user("+15555550100", &SecretString::from("wrong-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::WrongCredentials));
}

#[tokio::test]
async fn wrong_code_leaves_the_stored_code_usable() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let code = notifier.last_code().unwrap();

    let wrong = if code == "00000" { "00001" } else { "00000" };
    let err = flow.verify_account(user.id, wrong).await.unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalid));

    // The real code still works afterwards
    flow.verify_account(user.id, &code).await.unwrap();
}

#[tokio::test]
async fn expired_code_is_cleared_and_cannot_be_retried() {
    // Negative TTL: every issued code is already expired
    let (flow, _store, notifier) =
        setup_with(AuthConfig::new().with_otp_ttl(Duration::seconds(-1)));
    let user = flow.signup_user(jane()).await.unwrap();
    let code = notifier.last_code().unwrap();

    let err = flow.verify_account(user.id, &code).await.unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalid));

    // The expiry check wiped the pair, so the code is dead even if the
    // clock were rolled back
    let err = flow.verify_account(user.id, &code).await.unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalid));
}

#[tokio::test]
async fn verify_unknown_user_is_not_found() {
    let (flow, _store, _notifier) = setup();
    let err = flow
        .verify_account(Uuid::new_v4(), "00042")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn resend_replaces_the_stored_code() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let first = notifier.last_code().unwrap();

    flow.resend_code(user.id).await.unwrap();
    assert_eq!(notifier.sent_count(), 2);
    let second = notifier.last_code().unwrap();

    if first != second {
        let err = flow.verify_account(user.id, &first).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpInvalid));
    }
    flow.verify_account(user.id, &second).await.unwrap();
}

#[tokio::test]
async fn password_reset_round_trip() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let code = notifier.last_code().unwrap();
    flow.verify_account(user.id, &code).await.unwrap();

    let recovered = flow.forgot_password("+15555550100").await.unwrap();
    assert_eq!(recovered.id, user.id);
    let reset_code = notifier.last_code().unwrap();

    flow.reset_password(
        user.id,
        &reset_code,
        &SecretString::from("brand-new-password"),
    )
    .await
    .unwrap();

    // Old password is dead, new one logs in
    let err = flow
        .login_user("+15555550100", &SecretString::from("hunter22hunter22"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::WrongCredentials));

    flow.login_user("+15555550100", &SecretString::from("brand-new-password"))
        .await
        .unwrap();
}

#[tokio::test]
async fn forgot_password_requires_a_verified_account() {
    let (flow, _store, _notifier) = setup();
    flow.signup_user(jane()).await.unwrap();

    // Unverified accounts and unknown numbers look the same
    let err = flow.forgot_password("+15555550100").await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));

    let err = flow.forgot_password("+15555550199").await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn reset_with_wrong_code_keeps_the_old_password() {
    let (flow, _store, notifier) = setup();
    let user = flow.signup_user(jane()).await.unwrap();
    let code = notifier.last_code().unwrap();
    flow.verify_account(user.id, &code).await.unwrap();

    flow.forgot_password("+15555550100").await.unwrap();
    let reset_code = notifier.last_code().unwrap();
    let wrong = if reset_code == "00000" { "00001" } else { "00000" };

    let err = flow
        .reset_password(user.id, wrong, &SecretString::from("brand-new-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::OtpInvalid));

    flow.login_user("+15555550100", &SecretString::from("hunter22hunter22"))
        .await
        .unwrap();
}

#[tokio::test]
async fn delivery_failure_surfaces_but_account_is_created() {
    let store = Arc::new(MemoryIdentityStore::new());
    let flow = AuthFlow::new(
        store.clone(),
        Arc::new(FailingNotifier),
        SecretString::from("integration-secret"),
        AuthConfig::default(),
    );

    let err = flow.signup_user(jane()).await.unwrap_err();
    assert!(matches!(err, AuthError::DeliveryFailed));

    // A second signup attempt now hits the conflict, proving the record
    // survived the failed delivery
    let err = flow.signup_user(jane()).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict(ConflictKind::Email)));
}

#[tokio::test]
async fn manager_login_issues_a_manager_scoped_token() {
    let (flow, store, _notifier) = setup();
    let hasher = CredentialHasher::new();
    let now = Utc::now();
    let id = Uuid::new_v4();
    store
        .insert_manager(Manager {
            id,
            username: "ops-lead".to_string(),
            phone_number: "+15555550111".to_string(),
            password_hash: Some(hasher.hash(&SecretString::from("manager-pass")).unwrap()),
            role: Role::Director,
            created_at: now,
            updated_at: now,
        })
        .await;

    let (manager, token) = flow
        .login_manager("ops-lead", &SecretString::from("manager-pass"))
        .await
        .unwrap();
    assert_eq!(manager.id, id);
    assert!(manager.password_hash.is_none());

    let claims = flow.tokens().decode(&token).unwrap();
    assert_eq!(claims.scope, TokenScope::Manager);
    assert_eq!(claims.username.as_deref(), Some("ops-lead"));

    let err = flow
        .login_manager("ops-lead", &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::WrongCredentials));

    let err = flow
        .login_manager("nobody", &SecretString::from("manager-pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::WrongCredentials));
}
