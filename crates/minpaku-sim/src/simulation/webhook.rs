//! Inbound chat webhook payloads and intent classification.

use serde::{Deserialize, Serialize};

use super::relay::DeliveryTarget;

const RESULT_KEYWORDS: [&str; 6] = ["結果", "けっか", "ケッカ", "kekka", "結果を見る", "最新結果"];
const GREETINGS: [&str; 3] = ["こんにちは", "はじめまして", "ヘルプ"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl WebhookEvent {
    /// Trimmed text of a text-message event.
    pub fn text(&self) -> Option<&str> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.kind != "text" {
            return None;
        }
        message.text.as_deref().map(str::trim)
    }

    /// Reply token when present, otherwise the sender.
    pub fn target(&self) -> Option<DeliveryTarget> {
        if let Some(token) = self.reply_token.as_ref().filter(|token| !token.is_empty()) {
            return Some(DeliveryTarget::ReplyToken(token.clone()));
        }
        self.source
            .as_ref()
            .and_then(|source| source.user_id.clone())
            .map(DeliveryTarget::User)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    LatestResult,
    Greeting,
    Other,
}

impl ChatIntent {
    pub fn classify(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        if RESULT_KEYWORDS.contains(&normalized.as_str()) || normalized.contains("結果") {
            Self::LatestResult
        } else if GREETINGS.contains(&normalized.as_str()) {
            Self::Greeting
        } else {
            Self::Other
        }
    }
}
