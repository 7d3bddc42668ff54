use std::fmt;
use thiserror::Error;

/// Unique key that a create or update collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    Email,
    Phone,
    Username,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Phone => f.write_str("phone number"),
            Self::Username => f.write_str("username"),
        }
    }
}

/// Failure taxonomy for the credential and OTP flows.
///
/// `WrongCredentials` covers both "no such account" and "password mismatch"
/// on the login paths, so callers cannot probe which phone numbers exist.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} already registered")]
    Conflict(ConflictKind),

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("account not found")]
    NotFound,

    #[error("account not verified")]
    NotVerified,

    #[error("wrong or expired verification code")]
    OtpInvalid,

    #[error("page out of bounds")]
    PageOutOfBounds,

    #[error("could not deliver verification code")]
    DeliveryFailed,

    #[error("missing or malformed bearer token")]
    Unauthorized,

    #[error("invalid token")]
    InvalidToken,

    #[error("insufficient privileges")]
    Forbidden,

    #[error("identity store unavailable")]
    Store(#[source] anyhow::Error),
}

impl AuthError {
    pub(crate) fn store(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages() {
        assert_eq!(
            AuthError::Conflict(ConflictKind::Email).to_string(),
            "email already registered"
        );
        assert_eq!(
            AuthError::Conflict(ConflictKind::Phone).to_string(),
            "phone number already registered"
        );
    }

    #[test]
    fn test_store_error_keeps_source() {
        use std::error::Error;

        let err = AuthError::store(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "identity store unavailable");
        assert!(err.source().is_some_and(|source| source
            .to_string()
            .contains("connection refused")));
    }
}
