//! Persistence seam for identity records.

use crate::auth::identity::{
    Manager, ManagerUpdate, NewManagerRecord, NewUserRecord, User, UserDetailsUpdate, UserUpdate,
};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage operations the flows depend on.
///
/// Lookups by natural key take `with_secret`: only the login and password
/// flows opt into reading the stored credential hash, every other path gets
/// `password_hash: None`. Lookups by id never return the hash.
///
/// Uniqueness checks take `exclude` so an update can look for a conflict
/// without tripping over the record being updated.
///
/// All methods return `anyhow::Result`; the flow layer wraps failures into
/// [`crate::auth::AuthError::Store`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn user_email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool>;

    async fn user_phone_exists(&self, phone_number: &str, exclude: Option<Uuid>) -> Result<bool>;

    /// Insert a new unverified user. The returned record never carries the
    /// credential hash.
    async fn create_user(&self, record: NewUserRecord) -> Result<User>;

    async fn find_user_by_phone(&self, phone_number: &str, with_secret: bool)
        -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn count_users(&self) -> Result<u64>;

    /// A page of users ordered by creation time. Never returns hashes.
    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>>;

    /// Apply a partial update, returning the updated record or `None` if the
    /// user does not exist. An empty update is a plain re-read.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>>;

    /// Change contact details, returning the updated record or `None` if the
    /// user does not exist. Uniqueness of the new email/phone is the flow's
    /// responsibility.
    async fn update_user_details(
        &self,
        id: Uuid,
        update: UserDetailsUpdate,
    ) -> Result<Option<User>>;

    /// Remove a user. Returns `false` if no such record existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    async fn manager_username_exists(&self, username: &str, exclude: Option<Uuid>)
        -> Result<bool>;

    /// Insert a new manager. The returned record never carries the hash.
    async fn create_manager(&self, record: NewManagerRecord) -> Result<Manager>;

    async fn find_manager_by_username(
        &self,
        username: &str,
        with_secret: bool,
    ) -> Result<Option<Manager>>;

    async fn find_manager_by_id(&self, id: Uuid) -> Result<Option<Manager>>;

    /// All managers ordered by creation time, hashes stripped.
    async fn list_managers(&self) -> Result<Vec<Manager>>;

    /// Apply a partial update, returning the updated record or `None` if the
    /// manager does not exist.
    async fn update_manager(&self, id: Uuid, update: ManagerUpdate) -> Result<Option<Manager>>;

    /// Remove a manager. Returns `false` if no such record existed.
    async fn delete_manager(&self, id: Uuid) -> Result<bool>;
}
