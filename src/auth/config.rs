//! Tunable lifetimes for codes and tokens.

use chrono::Duration;

/// Lifetimes used when issuing codes and tokens. The defaults are the
/// production values; tests shrink them as needed.
#[derive(Clone, Copy, Debug)]
pub struct AuthConfig {
    otp_ttl: Duration,
    user_token_ttl: Duration,
    manager_token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::minutes(15),
            user_token_ttl: Duration::days(30),
            manager_token_ttl: Duration::hours(12),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_user_token_ttl(mut self, ttl: Duration) -> Self {
        self.user_token_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_manager_token_ttl(mut self, ttl: Duration) -> Self {
        self.manager_token_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn otp_ttl(&self) -> Duration {
        self.otp_ttl
    }

    #[must_use]
    pub const fn user_token_ttl(&self) -> Duration {
        self.user_token_ttl
    }

    #[must_use]
    pub const fn manager_token_ttl(&self) -> Duration {
        self.manager_token_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new();
        assert_eq!(config.otp_ttl(), Duration::minutes(15));
        assert_eq!(config.user_token_ttl(), Duration::days(30));
        assert_eq!(config.manager_token_ttl(), Duration::hours(12));
    }

    #[test]
    fn test_builder_overrides() {
        let config = AuthConfig::new()
            .with_otp_ttl(Duration::seconds(1))
            .with_user_token_ttl(Duration::hours(1))
            .with_manager_token_ttl(Duration::minutes(5));

        assert_eq!(config.otp_ttl(), Duration::seconds(1));
        assert_eq!(config.user_token_ttl(), Duration::hours(1));
        assert_eq!(config.manager_token_ttl(), Duration::minutes(5));
    }
}
