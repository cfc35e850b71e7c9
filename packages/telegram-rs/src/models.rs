use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SentMessage {
    pub message_id: i64,
    pub date: i64,
}

/// Envelope every Bot API method responds with.
#[derive(Deserialize, Debug, Clone)]
pub struct BotResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}
