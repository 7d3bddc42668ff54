use crate::cli::{actions::Action, commands};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Translate parsed arguments into an [`Action`].
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let token_secret = matches
        .get_one::<String>(commands::ARG_TOKEN_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --token-secret")?;
    let sms_gateway_url = matches
        .get_one::<String>(commands::ARG_SMS_GATEWAY_URL)
        .cloned();

    Ok(Action::Server {
        port,
        dsn,
        token_secret,
        sms_gateway_url,
    })
}
