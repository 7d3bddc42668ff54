//! Verification-code delivery.

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Delivers a verification code to a phone number. Delivery failures are
/// surfaced to the caller; the flows decide what they mean for the request.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, phone_number: &str, code: &str) -> Result<()>;
}

/// Logs the code instead of sending it. Used in development and tests when
/// no SMS gateway is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, phone_number: &str, code: &str) -> Result<()> {
        tracing::info!(phone_number, code, "verification code (log delivery)");
        Ok(())
    }
}

#[derive(Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    message: String,
}

/// Posts the code to an HTTP SMS gateway.
#[derive(Clone, Debug)]
pub struct HttpSmsNotifier {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpSmsNotifier {
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the HTTP client cannot
    /// be built.
    pub fn new(gateway_url: String) -> Result<Self> {
        let parsed = Url::parse(&gateway_url)
            .with_context(|| format!("Invalid SMS gateway URL: {gateway_url}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(anyhow!("SMS gateway URL must use http(s): {gateway_url}"));
        }

        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build SMS gateway client")?;

        Ok(Self {
            client,
            gateway_url,
        })
    }
}

#[async_trait]
impl Notifier for HttpSmsNotifier {
    async fn send(&self, phone_number: &str, code: &str) -> Result<()> {
        let payload = SmsPayload {
            to: phone_number,
            message: format!("Your verification code is {code}"),
        };

        let response = self
            .client
            .post(&self.gateway_url)
            .json(&payload)
            .send()
            .await
            .context("SMS gateway unreachable")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "SMS gateway returned status {}",
                response.status()
            ));
        }

        tracing::debug!(phone_number, "verification code dispatched");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.send("+15555550100", "00042").await.is_ok());
    }

    #[test]
    fn test_gateway_url_must_be_http() {
        assert!(HttpSmsNotifier::new("https://sms.example.com/send".to_string()).is_ok());
        assert!(HttpSmsNotifier::new("ftp://sms.example.com".to_string()).is_err());
        assert!(HttpSmsNotifier::new("not a url".to_string()).is_err());
    }

    #[test]
    fn test_sms_payload_shape() {
        let payload = SmsPayload {
            to: "+15555550100",
            message: "Your verification code is 00042".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"], "+15555550100");
        assert_eq!(json["message"], "Your verification code is 00042");
    }
}
