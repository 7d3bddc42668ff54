//! # Custode (Account authentication & OTP verification)
//!
//! `custode` is an authentication and account-management backend serving two
//! principal classes: end-users and staff managers with role-gated privileges.
//!
//! ## Credential & OTP lifecycle
//!
//! - Passwords are hashed with Argon2id (PHC string format) and never leave
//!   the flow/store boundary.
//! - Account verification and password reset are gated by a 5-digit one-time
//!   code delivered over an SMS channel, valid for 15 minutes and consumed on
//!   success or expiry.
//! - Successful logins and verifications issue HS256 bearer tokens carrying
//!   only non-secret claims (`sub` plus email or username).
//!
//! ## Manager tiers
//!
//! Managers carry one of three roles (`manager`, `director`, `monitor`)
//! ordered by privilege. Tier checks re-fetch the manager record from the
//! store rather than trusting the role embedded in the token, so a downgrade
//! takes effect before the token itself expires.

pub mod api;
pub mod auth;
pub mod cli;
pub mod notify;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
