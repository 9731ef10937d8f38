//! Conversation history per session.
//!
//! Sessions are keyed by session id (chat id + sender id) and hold the
//! ordered question/answer history sent to the stateless answer service as
//! one joined prompt. Append-only; entries live for process lifetime unless
//! the session is cleared. No eviction — a known resource gap of the design.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Unique session identifier (chat id concatenated with sender id).
pub type SessionId = String;

/// In-memory store for conversation histories (append, prompt, clear).
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<SessionId, Vec<String>>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append a question and return the full history joined into one prompt
    /// (space-separated). Creates the history when absent. One write lock for
    /// the read-append-join so concurrent handlers can't interleave.
    pub async fn append_question(&self, id: &str, question: impl Into<String>) -> String {
        let mut g = self.inner.write().await;
        let history = g.entry(id.to_string()).or_default();
        history.push(question.into());
        history.join(" ")
    }

    /// Append an answer to the session's history. No-op when the session was
    /// cleared between the question and the answer.
    pub async fn append_answer(&self, id: &str, answer: impl Into<String>) {
        let mut g = self.inner.write().await;
        if let Some(history) = g.get_mut(id) {
            history.push(answer.into());
        }
    }

    /// Remove the session entirely; subsequent lookups observe absence, not an
    /// empty history. Returns whether an entry existed.
    pub async fn clear(&self, id: &str) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    /// Return a clone of the session's history if it exists.
    pub async fn history(&self, id: &str) -> Option<Vec<String>> {
        self.inner.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_interleaves_questions_and_answers() {
        let store = SessionStore::new();
        store.append_question("s1", "q1").await;
        store.append_answer("s1", "a1").await;
        store.append_question("s1", "q2").await;
        store.append_answer("s1", "a2").await;
        assert_eq!(
            store.history("s1").await.unwrap(),
            vec!["q1", "a1", "q2", "a2"]
        );
    }

    #[tokio::test]
    async fn prompt_joins_full_history_with_spaces() {
        let store = SessionStore::new();
        assert_eq!(store.append_question("s1", "q1").await, "q1");
        store.append_answer("s1", "a1").await;
        assert_eq!(store.append_question("s1", "q2").await, "q1 a1 q2");
    }

    #[tokio::test]
    async fn clear_removes_the_key_entirely() {
        let store = SessionStore::new();
        store.append_question("s1", "q1").await;
        assert!(store.clear("s1").await);
        assert_eq!(store.history("s1").await, None);
        assert!(!store.clear("s1").await);
    }

    #[tokio::test]
    async fn answer_after_clear_is_dropped() {
        let store = SessionStore::new();
        store.append_question("s1", "q1").await;
        store.clear("s1").await;
        store.append_answer("s1", "a1").await;
        assert_eq!(store.history("s1").await, None);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        store.append_question("s1", "q1").await;
        store.append_question("s2", "other").await;
        assert_eq!(store.history("s1").await.unwrap(), vec!["q1"]);
        assert_eq!(store.history("s2").await.unwrap(), vec!["other"]);
    }
}
