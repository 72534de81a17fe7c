use serde::Serialize;
use tracing::{info, warn};

use super::{CommandError, ValidationError};
use crate::api::models::{QueryRequest, RetrievalResult};
use crate::feedback;
use crate::session::conversation::{
    placeholder_result, ConversationMessage, DEFAULT_ANSWER, DEGRADED_ANSWER,
};
use crate::session::Session;

/// How a query resolved. Both variants have appended one assistant message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum QueryOutcome {
    Answered { message: ConversationMessage },
    /// The backend could not be used; the appended message is the
    /// placeholder answer.
    Degraded {
        message: ConversationMessage,
        reason: String,
    },
}

impl QueryOutcome {
    pub fn message(&self) -> &ConversationMessage {
        match self {
            QueryOutcome::Answered { message } | QueryOutcome::Degraded { message, .. } => message,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, QueryOutcome::Degraded { .. })
    }
}

pub fn get_messages(session: &Session) -> Vec<ConversationMessage> {
    session.conversation().messages().to_vec()
}

/// Runs one query against the selected scopes.
///
/// Validation failures append nothing. Otherwise the user turn is appended
/// before the request goes out and exactly one assistant turn follows.
pub async fn send_query(session: &Session, text: &str) -> Result<QueryOutcome, CommandError> {
    let query = text.trim();
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }
    let scopes = session.scopes().selected().to_vec();
    if scopes.is_empty() {
        return Err(ValidationError::NoScopeSelected.into());
    }

    session.conversation().append_user(query);

    let client = session.client();
    let request = QueryRequest {
        query: query.to_string(),
        scopes,
    };
    let outcome = match client.query(&request).await {
        Ok(resp) => {
            let answer = resp
                .answer
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or(DEFAULT_ANSWER);
            let results = resp.results.unwrap_or_default();
            info!(scopes = request.scopes.len(), results = results.len(), "query answered");
            QueryOutcome::Answered {
                message: append_assistant(session, answer, results),
            }
        }
        Err(e) => {
            warn!(error = %e, "query failed, showing placeholder results");
            QueryOutcome::Degraded {
                message: append_assistant(session, DEGRADED_ANSWER, vec![placeholder_result()]),
                reason: e.to_string(),
            }
        }
    };
    Ok(outcome)
}

fn append_assistant(
    session: &Session,
    text: &str,
    results: Vec<RetrievalResult>,
) -> ConversationMessage {
    let mut log = session.conversation();
    let messages = log.append_assistant(text, Some(results));
    messages[messages.len() - 1].clone()
}

/// Marks result `result` of message `message` as used. The signal goes to
/// `scope_id` when given, otherwise to the first selected scope.
pub fn mark_result_used(
    session: &Session,
    message: usize,
    result: usize,
    scope_id: Option<String>,
) -> Result<(), CommandError> {
    let doc_id = session
        .conversation()
        .result(message, result)
        .map(|r| r.doc_id.clone())
        .ok_or(ValidationError::UnknownResult { message, result })?;
    let scope_id = match scope_id {
        Some(id) => id,
        None => session
            .scopes()
            .selected()
            .first()
            .cloned()
            .ok_or(ValidationError::NoScopeSelected)?,
    };
    feedback::record_used(session.client(), scope_id, doc_id);
    Ok(())
}

pub fn reset_conversation(session: &Session) {
    session.reset();
}
