use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::models::RetrievalResult;

/// Answer text used when the backend replies without one.
pub const DEFAULT_ANSWER: &str = "I found the following results:";
/// Assistant text appended when a query could not reach the backend.
pub const DEGRADED_ANSWER: &str = "Backend unavailable. Here are example results:";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub results: Option<Vec<RetrievalResult>>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    fn new(role: Role, content: &str, results: Option<Vec<RetrievalResult>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            results,
            timestamp: Utc::now(),
        }
    }

    pub fn results(&self) -> &[RetrievalResult] {
        self.results.as_deref().unwrap_or_default()
    }
}

/// The synthetic hit shown alongside [`DEGRADED_ANSWER`].
pub fn placeholder_result() -> RetrievalResult {
    RetrievalResult {
        doc_id: String::new(),
        url: "https://example.com".to_string(),
        title: Some("Example Result".to_string()),
        snippet: Some(
            "This is a placeholder result showing the conversation interface.".to_string(),
        ),
        score: Some(0.85),
        version: Some("1".to_string()),
        chunk_id: None,
    }
}

/// Append-only record of the turns in one session.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<ConversationMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: &str) -> &[ConversationMessage] {
        self.messages
            .push(ConversationMessage::new(Role::User, text, None));
        &self.messages
    }

    pub fn append_assistant(
        &mut self,
        text: &str,
        results: Option<Vec<RetrievalResult>>,
    ) -> &[ConversationMessage] {
        self.messages
            .push(ConversationMessage::new(Role::Assistant, text, results));
        &self.messages
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Result `result` of message `message`, both zero-based.
    pub fn result(&self, message: usize, result: usize) -> Option<&RetrievalResult> {
        self.messages.get(message)?.results().get(result)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_preserve_order_and_roles() {
        let mut log = ConversationLog::new();
        log.append_user("what changed?");
        let messages = log.append_assistant("answer", Some(vec![placeholder_result()]));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].results, None);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].results().len(), 1);
        assert_ne!(messages[0].id, messages[1].id);
    }

    #[test]
    fn result_lookup_is_bounds_checked() {
        let mut log = ConversationLog::new();
        log.append_user("q");
        log.append_assistant("a", Some(vec![placeholder_result()]));
        assert!(log.result(1, 0).is_some());
        assert!(log.result(1, 1).is_none());
        assert!(log.result(0, 0).is_none());
        assert!(log.result(7, 0).is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn reset_empties_the_log() {
        let mut log = ConversationLog::new();
        log.append_user("q");
        log.reset();
        assert!(log.is_empty());
    }
}
