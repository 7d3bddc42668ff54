//! In-memory identity store for tests and local development.

use crate::auth::identity::{
    FieldUpdate, Manager, ManagerUpdate, NewManagerRecord, NewUserRecord, User, UserDetailsUpdate,
    UserUpdate,
};
use crate::auth::store::IdentityStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    managers: HashMap<Uuid, Manager>,
}

/// HashMap-backed store. Records are kept with their secrets; lookups strip
/// them unless `with_secret` asks otherwise, mirroring the SQL projections.
#[derive(Default)]
pub struct MemoryIdentityStore {
    inner: Mutex<Inner>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a manager account with a fixed id, bypassing the uniqueness
    /// checks. Tests use this to bootstrap the first manager.
    pub async fn insert_manager(&self, manager: Manager) {
        let mut inner = self.inner.lock().await;
        inner.managers.insert(manager.id, manager);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn user_email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .any(|user| user.email == email && Some(user.id) != exclude))
    }

    async fn user_phone_exists(&self, phone_number: &str, exclude: Option<Uuid>) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .any(|user| user.phone_number == phone_number && Some(user.id) != exclude))
    }

    async fn create_user(&self, record: NewUserRecord) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            phone_number: record.phone_number,
            password_hash: Some(record.password_hash),
            verified: false,
            otp: Some(record.otp),
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().await;
        inner.users.insert(user.id, user.clone());

        Ok(user.without_secrets())
    }

    async fn find_user_by_phone(
        &self,
        phone_number: &str,
        with_secret: bool,
    ) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.phone_number == phone_number)
            .cloned()
            .map(|user| {
                if with_secret {
                    user
                } else {
                    User {
                        password_hash: None,
                        ..user
                    }
                }
            }))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned().map(|user| User {
            password_hash: None,
            ..user
        }))
    }

    async fn count_users(&self) -> Result<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.users.len() as u64)
    }

    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        // HashMap iteration order is arbitrary; sort for stable pages
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(User::without_secrets)
            .collect())
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        match update.password_hash {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => user.password_hash = None,
            FieldUpdate::Set(hash) => user.password_hash = Some(hash),
        }
        if let Some(verified) = update.verified {
            user.verified = verified;
        }
        match update.otp {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => user.otp = None,
            FieldUpdate::Set(otp) => user.otp = Some(otp),
        }
        user.updated_at = Utc::now();

        Ok(Some(User {
            password_hash: None,
            ..user.clone()
        }))
    }

    async fn update_user_details(
        &self,
        id: Uuid,
        update: UserDetailsUpdate,
    ) -> Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(phone_number) = update.phone_number {
            user.phone_number = phone_number;
        }
        user.updated_at = Utc::now();

        Ok(Some(User {
            password_hash: None,
            ..user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.remove(&id).is_some())
    }

    async fn manager_username_exists(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .managers
            .values()
            .any(|manager| manager.username == username && Some(manager.id) != exclude))
    }

    async fn create_manager(&self, record: NewManagerRecord) -> Result<Manager> {
        let now = Utc::now();
        let manager = Manager {
            id: Uuid::new_v4(),
            username: record.username,
            phone_number: record.phone_number,
            password_hash: Some(record.password_hash),
            role: record.role,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().await;
        inner.managers.insert(manager.id, manager.clone());

        Ok(manager.without_secrets())
    }

    async fn find_manager_by_username(
        &self,
        username: &str,
        with_secret: bool,
    ) -> Result<Option<Manager>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .managers
            .values()
            .find(|manager| manager.username == username)
            .cloned()
            .map(|manager| {
                if with_secret {
                    manager
                } else {
                    Manager {
                        password_hash: None,
                        ..manager
                    }
                }
            }))
    }

    async fn find_manager_by_id(&self, id: Uuid) -> Result<Option<Manager>> {
        let inner = self.inner.lock().await;
        Ok(inner.managers.get(&id).cloned().map(|manager| Manager {
            password_hash: None,
            ..manager
        }))
    }

    async fn list_managers(&self) -> Result<Vec<Manager>> {
        let inner = self.inner.lock().await;
        let mut managers: Vec<Manager> = inner.managers.values().cloned().collect();
        managers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(managers.into_iter().map(Manager::without_secrets).collect())
    }

    async fn update_manager(&self, id: Uuid, update: ManagerUpdate) -> Result<Option<Manager>> {
        let mut inner = self.inner.lock().await;
        let Some(manager) = inner.managers.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(username) = update.username {
            manager.username = username;
        }
        if let Some(phone_number) = update.phone_number {
            manager.phone_number = phone_number;
        }
        if let Some(hash) = update.password_hash {
            manager.password_hash = Some(hash);
        }
        if let Some(role) = update.role {
            manager.role = role;
        }
        manager.updated_at = Utc::now();

        Ok(Some(Manager {
            password_hash: None,
            ..manager.clone()
        }))
    }

    async fn delete_manager(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.managers.remove(&id).is_some())
    }
}
