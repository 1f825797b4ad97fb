//! Optional delivery of notifications to Telegram chats through the Bot API.
//!
//! Delivery is best effort: it runs on a spawned task and failures are only
//! logged. Without a bot token every call is a no-op.

use crate::error::AppError;
use common::model::notification::Notification;
use common::model::user::User;
use log::{debug, warn};
use serde::Serialize;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Clone)]
pub struct Telegram {
    token: Option<String>,
    http: reqwest::Client,
    api_base: String,
}

impl Telegram {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            http: reqwest::Client::new(),
            api_base: API_BASE.to_owned(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Sends one Markdown message to `chat_id`.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        self.http
            .post(url)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Queues delivery of `notification` to `recipient` if they linked a chat.
    pub fn dispatch(&self, recipient: &User, notification: &Notification) {
        if !self.is_enabled() {
            return;
        }
        let Some(chat_id) = recipient.telegram_chat_id.clone().filter(|c| !c.is_empty()) else {
            debug!("{} has no Telegram chat, skipping", recipient.username);
            return;
        };
        let text = format_notification(notification);
        let client = self.clone();
        let username = recipient.username.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_message(&chat_id, &text).await {
                warn!("Telegram delivery to {} failed: {}", username, e);
            }
        });
    }
}

pub fn format_notification(notification: &Notification) -> String {
    format!("*{}*\n\n{}", notification.title, notification.message)
}
