//! Webhook wire types: the event envelope Lark POSTs to `/webhook` and the
//! structured acknowledgment we answer with.
//!
//! The envelope is one of: a url_verification handshake (`type` + `challenge`),
//! an encrypted payload (`encrypt` — unsupported by this bridge), a bare body
//! without `header` (treated as a credential self-check), or a real event with
//! `header.event_type` and `header.event_id`.

use serde::{Deserialize, Serialize};

/// Event type for a new chat message (Lark events v2).
pub const MESSAGE_RECEIVE_EVENT: &str = "im.message.receive_v1";

/// Message type we can relay to the answer service.
pub const TEXT_MESSAGE_TYPE: &str = "text";

/// Inbound webhook envelope. All fields optional: the dispatcher decides the
/// payload's meaning from which ones are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    /// url_verification handshake value, echoed back unchanged.
    #[serde(default)]
    pub challenge: Option<String>,
    /// Present when the app has event encryption enabled (unsupported here).
    #[serde(default)]
    pub encrypt: Option<serde_json::Value>,
    #[serde(default)]
    pub header: Option<EventHeader>,
    #[serde(default)]
    pub event: Option<MessageEvent>,
}

/// Event header: unique id (dedup key) and type.
#[derive(Debug, Clone, Deserialize)]
pub struct EventHeader {
    pub event_id: String,
    pub event_type: String,
}

/// Body of an im.message.receive_v1 event.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub sender: Option<EventSender>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSender {
    #[serde(default)]
    pub sender_id: Option<SenderId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderId {
    #[serde(default)]
    pub open_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    pub message_id: String,
    pub chat_id: String,
    pub message_type: String,
    /// JSON string, e.g. `{"text":"@_user_1 hello"}` for text messages.
    #[serde(default)]
    pub content: Option<String>,
}

/// Structured acknowledgment returned for every webhook call. The platform
/// reads `code` (0 success, 1 config/validation failure, 2 unrecognized
/// event); HTTP status is always 200 for shape-valid payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: None,
            challenge: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: Some(message.into()),
            challenge: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: Some(message.into()),
            challenge: None,
        }
    }

    pub fn unrecognized() -> Self {
        Self {
            code: 2,
            message: Some("unrecognized event".to_string()),
            challenge: None,
        }
    }

    pub fn challenge(value: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: None,
            challenge: Some(value.into()),
        }
    }
}

/// Session id for a user-in-chat conversation thread: chat id concatenated
/// with sender id. Deterministic; lives for process lifetime unless cleared.
pub fn session_id(chat_id: &str, sender_id: &str) -> String {
    format!("{}{}", chat_id, sender_id)
}

/// Extract the text body from a message's `content` JSON, strip bot-mention
/// tokens and surrounding whitespace. Returns None when the result is empty
/// or the content is not a text payload.
pub fn extract_text(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let text = value.get("text").and_then(|t| t.as_str())?;
    let stripped = strip_mentions(text);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Remove `@_user_N` mention placeholders from a message text. Lark rewrites
/// at-mentions to these tokens before delivery; the answer service should
/// never see them.
pub fn strip_mentions(text: &str) -> String {
    const MENTION: &str = "@_user_";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(MENTION) {
        out.push_str(&rest[..start]);
        let after = &rest[start + MENTION.len()..];
        let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            // Not a mention token; keep the literal text.
            out.push_str(MENTION);
            rest = after;
        } else {
            rest = &after[digits..];
        }
    }
    out.push_str(rest);
    out
}
