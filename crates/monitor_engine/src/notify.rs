use std::time::Duration;

use monitor_logging::{monitor_debug, monitor_error, monitor_warn};
use serde::Deserialize;
use thiserror::Error;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Outgoing message channel. Delivery problems never reach the caller.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bot api rejected message (http {status}): {description}")]
    Rejected { status: u16, description: String },
    #[error("unreadable bot api response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
    pub request_timeout: Duration,
}

impl TelegramSettings {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram bot `sendMessage` method.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    settings: TelegramSettings,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| NotifyError::Client(err.without_url().to_string()))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.token
        )
    }

    /// Posts `text` as an HTML-formatted message.
    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[
                ("chat_id", self.settings.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await
            // The endpoint embeds the bot token.
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        let parsed: BotResponse = serde_json::from_str(&body).map_err(|err| {
            if status.is_success() {
                NotifyError::InvalidResponse(err.to_string())
            } else {
                NotifyError::Rejected {
                    status: status.as_u16(),
                    description: status.to_string(),
                }
            }
        })?;

        if !parsed.ok {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        match self.send_message(text).await {
            Ok(()) => monitor_debug!("Delivered message ({} chars)", text.chars().count()),
            Err(err @ NotifyError::Rejected { .. }) => {
                monitor_warn!("Failed to send Telegram message: {}", err)
            }
            Err(err) => monitor_error!("Error sending Telegram message: {}", err),
        }
    }
}
