use crate::{api, cli::actions::Action};
use anyhow::Result;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        dsn,
        token_secret,
        sms_gateway_url,
    } = action;

    api::new(port, dsn, token_secret, sms_gateway_url).await
}
