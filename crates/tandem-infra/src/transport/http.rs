//! HttpTransport -- concrete [`Transport`] implementation over a delivery
//! gateway's HTTP API.
//!
//! Sends each [`OutboundMessage`] as a JSON POST to `{api_url}/send` with a
//! bearer token. Status mapping: 403 means the recipient has blocked the bot
//! (`Unreachable`, which drives the pairing protocol's implicit close), 400
//! means the gateway rejected the markup (`InvalidMarkup`, which triggers
//! the stripped re-send in notification delivery).
//!
//! The token is wrapped in [`secrecy::SecretString`] and never appears in
//! Debug output or logs.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use tandem_core::engine::commands;
use tandem_core::transport::Transport;
use tandem_types::config::TransportConfig;
use tandem_types::error::SendError;
use tandem_types::event::{Keyboard, OutboundMessage, ParseMode};

/// HTTP delivery gateway client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: SecretString::from(config.token.clone()),
        }
    }
}

/// Render a semantic keyboard into the gateway's wire format.
///
/// Reply keyboards are rows of button labels; inline keyboards carry
/// callback data echoed back as button-press events.
fn render_keyboard(keyboard: &Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::ClientMenu => json!({
            "reply": [[commands::CONTACT_PROVIDER], [commands::NEW_BOOKING], [commands::CANCEL]]
        }),
        Keyboard::ProviderMenu => json!({
            "reply": [[commands::NEW_BOOKING], [commands::CANCEL]]
        }),
        Keyboard::ChatActive => json!({
            "reply": [[commands::END_CHAT]]
        }),
        Keyboard::CancelOnly => json!({
            "reply": [[commands::CANCEL]]
        }),
        Keyboard::RoleSelect { client_count, provider_count } => json!({
            "reply": [
                [format!("Log in as client ({client_count})")],
                [format!("Log in as provider ({provider_count})")],
            ]
        }),
        Keyboard::Inline { buttons } => json!({
            "inline": [buttons
                .iter()
                .map(|b| json!({ "text": b.label, "callback_data": b.data.to_string() }))
                .collect::<Vec<_>>()]
        }),
    }
}

impl Transport for HttpTransport {
    async fn send(&self, user_id: i64, message: &OutboundMessage) -> Result<(), SendError> {
        let mut payload = json!({
            "user_id": user_id,
            "text": message.text,
        });
        if let Some(file_id) = &message.photo_file_id {
            payload["photo_file_id"] = json!(file_id);
        }
        if message.parse_mode == Some(ParseMode::Html) {
            payload["parse_mode"] = json!("html");
        }
        if let Some(keyboard) = &message.keyboard {
            payload["keyboard"] = render_keyboard(keyboard);
        }

        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Failed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN => Err(SendError::Unreachable),
            StatusCode::BAD_REQUEST => Err(SendError::InvalidMarkup),
            status => Err(SendError::Failed(format!("gateway returned {status}"))),
        }
    }
}
