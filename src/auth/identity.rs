//! Identity records for users and managers.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A one-time code together with its expiry.
///
/// Code and expiry always travel together: issuing sets both, consuming
/// clears both. There is deliberately no way to set one without the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpIssue {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OtpIssue {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// An end-user account.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    /// Argon2id PHC string. Populated only when the lookup explicitly opted
    /// into reading the secret; stripped again before leaving the flow.
    pub password_hash: Option<String>,
    pub verified: bool,
    pub otp: Option<OtpIssue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Drop the credential and OTP fields before the record crosses the
    /// flow boundary.
    #[must_use]
    pub fn without_secrets(mut self) -> Self {
        self.password_hash = None;
        self.otp = None;
        self
    }
}

/// A staff account with a role-gated privilege tier.
#[derive(Clone, Debug)]
pub struct Manager {
    pub id: Uuid,
    pub username: String,
    pub phone_number: String,
    /// See [`User::password_hash`].
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manager {
    #[must_use]
    pub fn without_secrets(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// Closed set of manager roles, ordered by privilege:
/// `Manager` ⊃ `Director` ⊃ `Monitor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Manager,
    Director,
    Monitor,
}

impl Role {
    const fn rank(self) -> u8 {
        match self {
            Self::Manager => 3,
            Self::Director => 2,
            Self::Monitor => 1,
        }
    }

    /// Whether this role clears the given tier.
    #[must_use]
    pub const fn satisfies(self, tier: Tier) -> bool {
        self.rank() >= tier.minimum_rank()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Director => "director",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Unknown role strings are rejected at the store boundary rather than
    /// defaulting to the least-privileged tier.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "director" => Ok(Self::Director),
            "monitor" => Ok(Self::Monitor),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown manager role: {0}")]
pub struct UnknownRole(pub String);

/// Minimum privilege required by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Exactly the `manager` role.
    Manager,
    /// `manager` or `director`.
    Director,
    /// Any manager role.
    Monitor,
}

impl Tier {
    const fn minimum_rank(self) -> u8 {
        match self {
            Self::Manager => 3,
            Self::Director => 2,
            Self::Monitor => 1,
        }
    }
}

/// Tri-state update for a nullable field: keep it, clear it, or replace it.
///
/// Distinguishes "field omitted, leave unchanged" from "explicitly clear",
/// which a plain `Option` cannot express.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Fields accepted by [`crate::auth::store::IdentityStore::update_user`].
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub password_hash: FieldUpdate<String>,
    /// `verified` is not nullable, so a plain `Option` is enough here.
    pub verified: Option<bool>,
    pub otp: FieldUpdate<OtpIssue>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_keep() && self.verified.is_none() && self.otp.is_keep()
    }
}

/// Contact fields a director (or the account holder) may change on a user
/// record. `None` keeps the stored value; none of these are nullable.
#[derive(Clone, Debug, Default)]
pub struct UserDetailsUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl UserDetailsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
    }
}

/// Fields required to create a manager account.
#[derive(Clone, Debug)]
pub struct NewManagerRecord {
    pub username: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// Fields accepted by [`crate::auth::store::IdentityStore::update_manager`].
/// `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ManagerUpdate {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl ManagerUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.phone_number.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Fields required to create an unverified user.
#[derive(Clone, Debug)]
pub struct NewUserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub otp: OtpIssue,
}
