pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_secret: SecretString,
        sms_gateway_url: Option<String>,
    },
}
