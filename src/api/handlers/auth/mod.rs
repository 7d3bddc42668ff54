//! Credential, OTP, and account handlers.

pub mod guard;
pub mod login;
pub mod managers;
pub mod otp;
pub mod password;
pub mod signup;
pub mod types;
pub mod users;
