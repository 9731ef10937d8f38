//! Chat transport: the narrow surface the bridge needs from the platform.
//!
//! Trait so the dispatcher can be tested with a recording mock; the real
//! implementation talks to the Lark Open API.

mod lark;

pub use lark::LarkTransport;

use async_trait::async_trait;
use std::path::Path;

/// Provider error code for "bot removed from the conversation". Distinguished
/// in logs only; control flow treats it like any other transport error.
pub const BOT_REMOVED_CODE: i64 = 230002;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("reading image file failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("lark api error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("image file not found: {0}")]
    NotFound(String),
}

impl TransportError {
    /// True when the provider says the bot is no longer in the chat.
    pub fn is_bot_removed(&self) -> bool {
        matches!(self, TransportError::Api { code, .. } if *code == BOT_REMOVED_CODE)
    }
}

/// Outbound messaging surface consumed by the dispatcher.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Reply to a message with plain/rich text.
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), TransportError>;
    /// Reply to a message with a previously uploaded image.
    async fn reply_image(&self, message_id: &str, image_key: &str) -> Result<(), TransportError>;
    /// Upload image bytes; returns the opaque image key to reference in replies.
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<String, TransportError>;
}

/// Upload an image from the filesystem: verify existence, read, upload.
/// NotFound and upload failures propagate so the caller can fall back to a
/// text-only reply.
pub async fn upload_image_file<T: ChatTransport + ?Sized>(
    transport: &T,
    path: &Path,
) -> Result<String, TransportError> {
    if !path.exists() {
        return Err(TransportError::NotFound(path.display().to_string()));
    }
    let bytes = tokio::fs::read(path).await?;
    transport.upload_image(bytes).await
}
