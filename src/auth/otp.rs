//! One-time verification codes.

use crate::auth::identity::OtpIssue;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Number of digits in a verification code.
pub const OTP_DIGITS: usize = 5;

const OTP_SPACE: u32 = 100_000;

/// Issues fixed-width numeric codes with an attached expiry.
#[derive(Clone, Copy, Debug)]
pub struct OtpGenerator {
    ttl: Duration,
}

impl Default for OtpGenerator {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(15),
        }
    }
}

impl OtpGenerator {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Draw a code uniformly over the full 5-digit space, zero-padded so the
    /// width is fixed.
    #[must_use]
    pub fn generate(&self) -> String {
        let value = rand::thread_rng().gen_range(0..OTP_SPACE);
        format!("{value:05}")
    }

    #[must_use]
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    /// A fresh code expiring `ttl` from now.
    #[must_use]
    pub fn issue(&self) -> OtpIssue {
        OtpIssue {
            code: self.generate(),
            expires_at: self.expiry_from(Utc::now()),
        }
    }
}
