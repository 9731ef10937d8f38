//! Answer service client: sends the accumulated conversation prompt to the
//! downstream QA service and validates its response schema.
//!
//! The service is stateless — it sees only the prompt we send — and
//! responds with answer text plus optional artifacts (image file paths the
//! bridge uploads to the chat platform).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("answer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("answer api error: {0}")]
    Api(String),
    #[error("invalid answer response: {0}")]
    InvalidResponse(String),
}

/// What an artifact is (only images today).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
}

/// A non-text payload attached to an answer. `data` is an opaque reference
/// the upload path resolves (a filesystem path for images).
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub data: String,
}

/// A validated answer: text plus ordered artifacts (absent => empty).
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct WireAnswer {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    artifacts: Option<Vec<Artifact>>,
}

/// Validate a raw response body into an Answer. `text` is required; anything
/// else is rejected explicitly rather than patched over.
fn parse_answer(value: serde_json::Value) -> Result<Answer, AnswerError> {
    let wire: WireAnswer = serde_json::from_value(value)
        .map_err(|e| AnswerError::InvalidResponse(e.to_string()))?;
    let text = wire
        .text
        .ok_or_else(|| AnswerError::InvalidResponse("missing text field".to_string()))?;
    Ok(Answer {
        text,
        artifacts: wire.artifacts.unwrap_or_default(),
    })
}

/// Capability surface of the downstream QA service.
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Ask with the full client-supplied context window; returns the answer
    /// or fails on network/parse/malformed-response.
    async fn ask(&self, prompt: &str) -> Result<Answer, AnswerError>;
}

/// HTTP client for the answer service.
pub struct HttpAnswerClient {
    url: String,
    client: reqwest::Client,
}

impl HttpAnswerClient {
    pub fn new(url: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnswerService for HttpAnswerClient {
    async fn ask(&self, prompt: &str) -> Result<Answer, AnswerError> {
        let body = json!({ "question": prompt });
        let res = self.client.post(&self.url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AnswerError::Api(format!("{} {}", status, text)));
        }
        let value: serde_json::Value = res.json().await?;
        parse_answer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_only_answer() {
        let answer = parse_answer(json!({"text": "42"})).unwrap();
        assert_eq!(answer.text, "42");
        assert!(answer.artifacts.is_empty());
    }

    #[test]
    fn parses_answer_with_image_artifacts() {
        let answer = parse_answer(json!({
            "text": "here you go",
            "artifacts": [
                {"kind": "image", "data": "/tmp/a.png"},
                {"kind": "image", "data": "/tmp/b.png"}
            ]
        }))
        .unwrap();
        assert_eq!(answer.artifacts.len(), 2);
        assert_eq!(answer.artifacts[0].kind, ArtifactKind::Image);
        assert_eq!(answer.artifacts[1].data, "/tmp/b.png");
    }

    #[test]
    fn rejects_missing_text() {
        let err = parse_answer(json!({"artifacts": []})).unwrap_err();
        assert!(matches!(err, AnswerError::InvalidResponse(_)));
    }

    #[test]
    fn rejects_unknown_artifact_kind() {
        let err = parse_answer(json!({
            "text": "x",
            "artifacts": [{"kind": "video", "data": "/tmp/v.mp4"}]
        }))
        .unwrap_err();
        assert!(matches!(err, AnswerError::InvalidResponse(_)));
    }
}
