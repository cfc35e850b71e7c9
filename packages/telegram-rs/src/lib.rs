// https://core.telegram.org/bots/api#sendmessage

pub mod models;
use reqwest::Client;

use crate::models::{BotResponse, SendMessageRequest, SentMessage};

/// Telegram rejects message text longer than this.
pub const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    pub async fn send_message(&self, text: &str) -> Result<SentMessage, &'static str> {
        let url = format!(
            "https://api.telegram.org/bot{token}/sendMessage",
            token = self.options.bot_token
        );

        let text = truncate_message(text);
        let body = SendMessageRequest {
            chat_id: &self.options.chat_id,
            text: &text,
            disable_notification: None,
        };

        let res = self.client.post(url).json(&body).send().await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Telegram error ({}): {}", status, error_body);
                    return Err("Telegram returned an error");
                }

                match response.json::<BotResponse<SentMessage>>().await {
                    Ok(BotResponse {
                        ok: true,
                        result: Some(message),
                        ..
                    }) => Ok(message),
                    Ok(other) => {
                        eprintln!(
                            "Telegram rejected message: {}",
                            other.description.unwrap_or_default()
                        );
                        Err("Telegram rejected the message")
                    }
                    Err(e) => {
                        eprintln!("Failed to parse Telegram response: {}", e);
                        Err("Error parsing Telegram response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Telegram failed: {}", e);
                Err("Error sending Telegram message")
            }
        }
    }
}

/// Cut text down to the Bot API limit on a char boundary.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text.to_string();
    }
    text.chars().take(MAX_MESSAGE_LEN).collect()
}
