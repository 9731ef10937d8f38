//! Lark Open API client: tenant token, message replies, image upload.

use crate::transport::{ChatTransport, TransportError, BOT_REMOVED_CODE};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis";

/// Client for the Lark messaging API. Fetches a tenant access token per
/// outbound call; tokens are not cached.
pub struct LarkTransport {
    base_url: String,
    app_id: String,
    app_secret: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl LarkTransport {
    pub fn new(app_id: String, app_secret: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            base_url,
            app_id,
            app_secret,
            client: reqwest::Client::new(),
        }
    }

    /// POST /auth/v3/tenant_access_token/internal — fetch a tenant token.
    async fn tenant_token(&self) -> Result<String, TransportError> {
        let url = format!("{}/auth/v3/tenant_access_token/internal", self.base_url);
        let body = json!({ "app_id": self.app_id, "app_secret": self.app_secret });
        let res = self.client.post(&url).json(&body).send().await?;
        let data: TokenResponse = res.json().await?;
        if data.code != 0 {
            return Err(TransportError::Api {
                code: data.code,
                message: data.msg,
            });
        }
        data.tenant_access_token.ok_or(TransportError::Api {
            code: -1,
            message: "token response missing tenant_access_token".to_string(),
        })
    }

    /// POST /im/v1/messages/{id}/reply with the given msg_type and content
    /// (content is the JSON-encoded message body Lark expects).
    async fn reply(
        &self,
        message_id: &str,
        msg_type: &str,
        content: String,
    ) -> Result<(), TransportError> {
        let token = self.tenant_token().await?;
        let url = format!("{}/im/v1/messages/{}/reply", self.base_url, message_id);
        let body = json!({ "msg_type": msg_type, "content": content });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        let data: ApiResponse = res.json().await?;
        if data.code != 0 {
            let err = TransportError::Api {
                code: data.code,
                message: data.msg,
            };
            if data.code == BOT_REMOVED_CODE {
                log::warn!("lark reply: bot was removed from the chat ({})", err);
            } else {
                log::warn!("lark reply failed: {}", err);
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for LarkTransport {
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), TransportError> {
        let content = json!({ "text": text }).to_string();
        self.reply(message_id, "text", content).await
    }

    async fn reply_image(&self, message_id: &str, image_key: &str) -> Result<(), TransportError> {
        let content = json!({ "image_key": image_key }).to_string();
        self.reply(message_id, "image", content).await
    }

    /// POST /im/v1/images (multipart) — returns the image_key.
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<String, TransportError> {
        let token = self.tenant_token().await?;
        let url = format!("{}/im/v1/images", self.base_url);
        let form = reqwest::multipart::Form::new()
            .text("image_type", "message")
            .part("image", reqwest::multipart::Part::bytes(bytes).file_name("image"));
        let res = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;
        let data: ApiResponse = res.json().await?;
        if data.code != 0 {
            return Err(TransportError::Api {
                code: data.code,
                message: data.msg,
            });
        }
        data.data
            .as_ref()
            .and_then(|d| d.get("image_key"))
            .and_then(|k| k.as_str())
            .map(|k| k.to_string())
            .ok_or(TransportError::Api {
                code: -1,
                message: "upload response missing image_key".to_string(),
            })
    }
}
