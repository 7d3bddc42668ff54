//! Credential verification and one-time-code lifecycle.
//!
//! The flow orchestrator composes four leaves (hashing, OTP generation,
//! token issuance, and the notifier) on top of an [`store::IdentityStore`].
//! Everything here is transport-agnostic; the HTTP surface lives in
//! [`crate::api`].

pub mod config;
pub mod error;
pub mod flow;
pub mod identity;
pub mod otp;
pub mod password;
pub mod store;
pub mod token;

pub use config::AuthConfig;
pub use error::{AuthError, ConflictKind};
pub use flow::{AuthFlow, ManagerChange, NewManager, NewUser, UserPage};
pub use identity::{FieldUpdate, Manager, OtpIssue, Role, Tier, User, UserDetailsUpdate};
pub use otp::OtpGenerator;
pub use password::CredentialHasher;
pub use store::IdentityStore;
pub use token::{TokenClaims, TokenIssuer, TokenScope};
