//! Flow orchestration for signup, login, and the OTP lifecycle.

use crate::auth::{
    config::AuthConfig,
    error::{AuthError, ConflictKind},
    identity::{
        FieldUpdate, Manager, ManagerUpdate, NewManagerRecord, NewUserRecord, Role, User,
        UserDetailsUpdate, UserUpdate,
    },
    otp::OtpGenerator,
    password::CredentialHasher,
    store::IdentityStore,
    token::TokenIssuer,
};
use crate::notify::Notifier;
use anyhow::anyhow;
use secrecy::SecretString;
use std::sync::Arc;
use uuid::Uuid;

/// Signup input. The password arrives wrapped and is only ever exposed to
/// the hasher.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: SecretString,
}

/// Input for provisioning a manager account.
#[derive(Clone, Debug)]
pub struct NewManager {
    pub username: String,
    pub phone_number: String,
    pub password: SecretString,
    pub role: Role,
}

/// Partial manager update. The raw password is hashed inside the flow.
#[derive(Clone, Debug, Default)]
pub struct ManagerChange {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<SecretString>,
    pub role: Option<Role>,
}

/// One page of the user directory.
#[derive(Clone, Debug)]
pub struct UserPage {
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub users: Vec<User>,
}

/// Orchestrates the credential and OTP flows over an [`IdentityStore`].
///
/// Holds no per-request state; one instance is shared across the server.
#[derive(Clone)]
pub struct AuthFlow {
    store: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
    hasher: CredentialHasher,
    otp: OtpGenerator,
    tokens: TokenIssuer,
}

impl AuthFlow {
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
        token_secret: SecretString,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            hasher: CredentialHasher::new(),
            otp: OtpGenerator::new(config.otp_ttl()),
            tokens: TokenIssuer::new(
                token_secret,
                config.user_token_ttl(),
                config.manager_token_ttl(),
            ),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new user and send the first verification code.
    ///
    /// Uniqueness is checked email first, then phone, so a request colliding
    /// on both reports the email conflict. The account is created unverified
    /// even if code delivery fails.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] on a duplicate email or phone number,
    /// [`AuthError::DeliveryFailed`] if the code could not be sent.
    #[tracing::instrument(skip_all, fields(email = %new_user.email))]
    pub async fn signup_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        if self
            .store
            .user_email_exists(&new_user.email, None)
            .await
            .map_err(AuthError::store)?
        {
            return Err(AuthError::Conflict(ConflictKind::Email));
        }

        if self
            .store
            .user_phone_exists(&new_user.phone_number, None)
            .await
            .map_err(AuthError::store)?
        {
            return Err(AuthError::Conflict(ConflictKind::Phone));
        }

        let password_hash = self.hasher.hash(&new_user.password).map_err(AuthError::store)?;
        let otp = self.otp.issue();

        let user = self
            .store
            .create_user(NewUserRecord {
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                email: new_user.email,
                phone_number: new_user.phone_number,
                password_hash,
                otp: otp.clone(),
            })
            .await
            .map_err(AuthError::store)?;

        tracing::info!(user_id = %user.id, "user created, dispatching verification code");

        if let Err(err) = self.notifier.send(&user.phone_number, &otp.code).await {
            // The account exists and a later resend can recover it.
            tracing::warn!(user_id = %user.id, %err, "verification code delivery failed");
            return Err(AuthError::DeliveryFailed);
        }

        Ok(user.without_secrets())
    }

    /// Authenticate a user by phone number and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongCredentials`] for an unknown phone number or
    /// a password mismatch alike, [`AuthError::NotVerified`] when the
    /// credentials are right but the account never completed verification.
    #[tracing::instrument(skip_all)]
    pub async fn login_user(
        &self,
        phone_number: &str,
        password: &SecretString,
    ) -> Result<(User, String), AuthError> {
        let Some(user) = self
            .store
            .find_user_by_phone(phone_number, true)
            .await
            .map_err(AuthError::store)?
        else {
            return Err(AuthError::WrongCredentials);
        };

        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AuthError::store(anyhow!("credential lookup returned no hash")))?;

        if !self
            .hasher
            .verify(password, stored_hash)
            .map_err(AuthError::store)?
        {
            return Err(AuthError::WrongCredentials);
        }

        if !user.verified {
            return Err(AuthError::NotVerified);
        }

        let token = self.tokens.issue_user_token(user.id, &user.email)?;

        Ok((user.without_secrets(), token))
    }

    /// Authenticate a manager by username and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongCredentials`] for an unknown username or a
    /// password mismatch alike.
    #[tracing::instrument(skip_all)]
    pub async fn login_manager(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(Manager, String), AuthError> {
        let Some(manager) = self
            .store
            .find_manager_by_username(username, true)
            .await
            .map_err(AuthError::store)?
        else {
            return Err(AuthError::WrongCredentials);
        };

        let stored_hash = manager
            .password_hash
            .as_deref()
            .ok_or_else(|| AuthError::store(anyhow!("credential lookup returned no hash")))?;

        if !self
            .hasher
            .verify(password, stored_hash)
            .map_err(AuthError::store)?
        {
            return Err(AuthError::WrongCredentials);
        }

        let token = self.tokens.issue_manager_token(manager.id, &manager.username)?;

        Ok((manager.without_secrets(), token))
    }

    /// Consume a verification code and mark the account verified.
    ///
    /// An expired or absent code is cleared before failing, forcing a fresh
    /// resend. A plain mismatch leaves the stored code in place so the user
    /// can retry within the window.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown user and
    /// [`AuthError::OtpInvalid`] for a wrong, expired, or missing code.
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn verify_account(&self, id: Uuid, code: &str) -> Result<(User, String), AuthError> {
        let user = self
            .store
            .find_user_by_id(id)
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        let otp = match self.usable_otp(&user).await? {
            Some(otp) => otp,
            None => return Err(AuthError::OtpInvalid),
        };

        if otp.code != code {
            return Err(AuthError::OtpInvalid);
        }

        let updated = self
            .store
            .update_user(
                id,
                UserUpdate {
                    verified: Some(true),
                    otp: FieldUpdate::Clear,
                    ..UserUpdate::default()
                },
            )
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        let token = self.tokens.issue_user_token(updated.id, &updated.email)?;

        tracing::info!("account verified");

        Ok((updated.without_secrets(), token))
    }

    /// Start a password reset by sending a fresh code.
    ///
    /// Only verified accounts may reset; an unknown or unverified account
    /// reports [`AuthError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] or [`AuthError::DeliveryFailed`].
    #[tracing::instrument(skip_all)]
    pub async fn forgot_password(&self, phone_number: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_phone(phone_number, false)
            .await
            .map_err(AuthError::store)?
            .filter(|user| user.verified)
            .ok_or(AuthError::NotFound)?;

        self.issue_and_send(user.id, &user.phone_number).await?;

        Ok(user.without_secrets())
    }

    /// Issue a fresh code for an existing account, replacing any stored one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] or [`AuthError::DeliveryFailed`].
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn resend_code(&self, id: Uuid) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user_by_id(id)
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        self.issue_and_send(user.id, &user.phone_number).await
    }

    /// Complete a password reset: consume the code, store the new hash.
    ///
    /// Same code semantics as [`Self::verify_account`], but restricted to
    /// verified accounts and no token is issued; the user logs in again with
    /// the new password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] or [`AuthError::OtpInvalid`].
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn reset_password(
        &self,
        id: Uuid,
        code: &str,
        new_password: &SecretString,
    ) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user_by_id(id)
            .await
            .map_err(AuthError::store)?
            .filter(|user| user.verified)
            .ok_or(AuthError::NotFound)?;

        let otp = match self.usable_otp(&user).await? {
            Some(otp) => otp,
            None => return Err(AuthError::OtpInvalid),
        };

        if otp.code != code {
            return Err(AuthError::OtpInvalid);
        }

        let password_hash = self.hasher.hash(new_password).map_err(AuthError::store)?;

        self.store
            .update_user(
                id,
                UserUpdate {
                    password_hash: FieldUpdate::Set(password_hash),
                    otp: FieldUpdate::Clear,
                    ..UserUpdate::default()
                },
            )
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        tracing::info!("password reset completed");

        Ok(())
    }

    /// Page through the user directory, 1-based.
    ///
    /// An empty directory is a valid empty page; a page past the end is an
    /// error so callers cannot silently iterate forever.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PageOutOfBounds`] when `page` is zero or past the
    /// last page of a non-empty directory.
    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self, page: u64, per_page: u64) -> Result<UserPage, AuthError> {
        let per_page = per_page.max(1);
        let total = self.store.count_users().await.map_err(AuthError::store)?;

        if total == 0 {
            return Ok(UserPage {
                page: 0,
                total_pages: 0,
                total: 0,
                users: Vec::new(),
            });
        }

        let total_pages = total.div_ceil(per_page);
        if page == 0 || page > total_pages {
            return Err(AuthError::PageOutOfBounds);
        }

        let users = self
            .store
            .list_users((page - 1) * per_page, per_page)
            .await
            .map_err(AuthError::store)?
            .into_iter()
            .map(User::without_secrets)
            .collect();

        Ok(UserPage {
            page,
            total_pages,
            total,
            users,
        })
    }

    /// Change a user's contact details on behalf of a director.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the new email or phone number
    /// belongs to another account, [`AuthError::NotFound`] for an unknown
    /// user.
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn update_user_details(
        &self,
        id: Uuid,
        update: UserDetailsUpdate,
    ) -> Result<User, AuthError> {
        if let Some(email) = &update.email {
            if self
                .store
                .user_email_exists(email, Some(id))
                .await
                .map_err(AuthError::store)?
            {
                return Err(AuthError::Conflict(ConflictKind::Email));
            }
        }

        if let Some(phone_number) = &update.phone_number {
            if self
                .store
                .user_phone_exists(phone_number, Some(id))
                .await
                .map_err(AuthError::store)?
            {
                return Err(AuthError::Conflict(ConflictKind::Phone));
            }
        }

        let updated = self
            .store
            .update_user_details(id, update)
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        Ok(updated.without_secrets())
    }

    /// Change contact details on the requester's own account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] when the token's subject and the
    /// target id differ, plus everything [`Self::update_user_details`]
    /// reports.
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn update_own_profile(
        &self,
        requester: Uuid,
        id: Uuid,
        update: UserDetailsUpdate,
    ) -> Result<User, AuthError> {
        if requester != id {
            tracing::warn!(%requester, "profile update for another account rejected");
            return Err(AuthError::Forbidden);
        }

        self.update_user_details(id, update).await
    }

    /// Remove a user account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown user.
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        if !self.store.delete_user(id).await.map_err(AuthError::store)? {
            return Err(AuthError::NotFound);
        }

        tracing::info!("user deleted");

        Ok(())
    }

    /// Remove the requester's own account after re-checking credentials.
    ///
    /// The phone number and password are verified exactly as for login, so a
    /// stolen token alone cannot destroy the account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongCredentials`] for a bad phone/password pair
    /// and [`AuthError::Forbidden`] when the credentials belong to a
    /// different account than the token's subject.
    #[tracing::instrument(skip_all, fields(user_id = %requester))]
    pub async fn delete_own_account(
        &self,
        requester: Uuid,
        phone_number: &str,
        password: &SecretString,
    ) -> Result<(), AuthError> {
        let Some(user) = self
            .store
            .find_user_by_phone(phone_number, true)
            .await
            .map_err(AuthError::store)?
        else {
            return Err(AuthError::WrongCredentials);
        };

        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AuthError::store(anyhow!("credential lookup returned no hash")))?;

        if !self
            .hasher
            .verify(password, stored_hash)
            .map_err(AuthError::store)?
        {
            return Err(AuthError::WrongCredentials);
        }

        if user.id != requester {
            tracing::warn!("account deletion with another user's credentials rejected");
            return Err(AuthError::Forbidden);
        }

        self.delete_user(user.id).await
    }

    /// Provision a manager account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the username is taken.
    #[tracing::instrument(skip_all, fields(username = %new_manager.username))]
    pub async fn create_manager(&self, new_manager: NewManager) -> Result<Manager, AuthError> {
        if self
            .store
            .manager_username_exists(&new_manager.username, None)
            .await
            .map_err(AuthError::store)?
        {
            return Err(AuthError::Conflict(ConflictKind::Username));
        }

        let password_hash = self
            .hasher
            .hash(&new_manager.password)
            .map_err(AuthError::store)?;

        let manager = self
            .store
            .create_manager(NewManagerRecord {
                username: new_manager.username,
                phone_number: new_manager.phone_number,
                password_hash,
                role: new_manager.role,
            })
            .await
            .map_err(AuthError::store)?;

        tracing::info!(manager_id = %manager.id, role = %manager.role, "manager created");

        Ok(manager.without_secrets())
    }

    /// All manager accounts, hashes stripped.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] when the store is unavailable.
    pub async fn list_managers(&self) -> Result<Vec<Manager>, AuthError> {
        Ok(self
            .store
            .list_managers()
            .await
            .map_err(AuthError::store)?
            .into_iter()
            .map(Manager::without_secrets)
            .collect())
    }

    /// Look up a manager by id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown manager.
    pub async fn get_manager(&self, id: Uuid) -> Result<Manager, AuthError> {
        let manager = self
            .store
            .find_manager_by_id(id)
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        Ok(manager.without_secrets())
    }

    /// Change a manager account. A new password is re-hashed here.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the new username belongs to
    /// another manager, [`AuthError::NotFound`] for an unknown manager.
    #[tracing::instrument(skip_all, fields(manager_id = %id))]
    pub async fn update_manager(
        &self,
        id: Uuid,
        change: ManagerChange,
    ) -> Result<Manager, AuthError> {
        if let Some(username) = &change.username {
            if self
                .store
                .manager_username_exists(username, Some(id))
                .await
                .map_err(AuthError::store)?
            {
                return Err(AuthError::Conflict(ConflictKind::Username));
            }
        }

        let password_hash = match &change.password {
            Some(password) => Some(self.hasher.hash(password).map_err(AuthError::store)?),
            None => None,
        };

        let updated = self
            .store
            .update_manager(
                id,
                ManagerUpdate {
                    username: change.username,
                    phone_number: change.phone_number,
                    password_hash,
                    role: change.role,
                },
            )
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        Ok(updated.without_secrets())
    }

    /// Remove a manager account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown manager.
    #[tracing::instrument(skip_all, fields(manager_id = %id))]
    pub async fn delete_manager(&self, id: Uuid) -> Result<(), AuthError> {
        if !self
            .store
            .delete_manager(id)
            .await
            .map_err(AuthError::store)?
        {
            return Err(AuthError::NotFound);
        }

        tracing::info!("manager deleted");

        Ok(())
    }

    /// Return the stored code if one exists and is still within its window.
    /// An expired or missing code is cleared here so stale state cannot be
    /// retried against.
    async fn usable_otp(
        &self,
        user: &User,
    ) -> Result<Option<crate::auth::identity::OtpIssue>, AuthError> {
        match &user.otp {
            Some(otp) if !otp.is_expired(chrono::Utc::now()) => Ok(Some(otp.clone())),
            _ => {
                self.store
                    .update_user(
                        user.id,
                        UserUpdate {
                            otp: FieldUpdate::Clear,
                            ..UserUpdate::default()
                        },
                    )
                    .await
                    .map_err(AuthError::store)?;
                Ok(None)
            }
        }
    }

    async fn issue_and_send(&self, id: Uuid, phone_number: &str) -> Result<(), AuthError> {
        let otp = self.otp.issue();

        self.store
            .update_user(
                id,
                UserUpdate {
                    otp: FieldUpdate::Set(otp.clone()),
                    ..UserUpdate::default()
                },
            )
            .await
            .map_err(AuthError::store)?
            .ok_or(AuthError::NotFound)?;

        if let Err(err) = self.notifier.send(phone_number, &otp.code).await {
            tracing::warn!(user_id = %id, %err, "verification code delivery failed");
            return Err(AuthError::DeliveryFailed);
        }

        Ok(())
    }
}
