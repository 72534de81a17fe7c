mod common;

use std::time::Duration;

use common::session_for;
use owlerlite_lib::commands::chat::{self, QueryOutcome};
use owlerlite_lib::commands::{CommandError, ValidationError};
use owlerlite_lib::db::models::Settings;
use owlerlite_lib::db::Database;
use owlerlite_lib::session::conversation::{Role, DEFAULT_ANSWER, DEGRADED_ANSWER};
use owlerlite_lib::session::{Connectivity, Session};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─── Successful queries ─────────────────────────────────────────────────────

#[tokio::test]
async fn query_appends_user_then_assistant_with_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"query": "what is lineage?", "scopes": ["s1", "s2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Lineage is the snapshot history.",
            "results": [
                {"docId": "d1", "url": "https://a.example/1", "title": "One", "score": 0.91, "version": "3", "chunkId": 7},
                {"doc_id": "d2", "url": "https://a.example/2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.scopes().toggle("s1");
    session.scopes().toggle("s2");

    let outcome = chat::send_query(&session, "  what is lineage?  ").await.unwrap();
    assert!(!outcome.is_degraded());

    let messages = chat::get_messages(&session);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "what is lineage?");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Lineage is the snapshot history.");
    let results = messages[1].results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk_id, Some(7));
    assert_eq!(results[1].doc_id, "d2");
    assert_eq!(outcome.message(), &messages[1]);
}

#[tokio::test]
async fn missing_answer_and_results_use_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.scopes().toggle("s1");
    let outcome = chat::send_query(&session, "anything").await.unwrap();

    let message = outcome.message();
    assert_eq!(message.content, DEFAULT_ANSWER);
    assert_eq!(message.results, Some(vec![]));
}

// ─── Validation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_selection_appends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let err = chat::send_query(&session, "hello").await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Validation(ValidationError::NoScopeSelected)
    ));
    assert!(err.is_validation());
    assert!(chat::get_messages(&session).is_empty());
}

#[tokio::test]
async fn blank_query_appends_nothing() {
    let server = MockServer::start().await;
    let session = session_for(&server);
    session.scopes().toggle("s1");

    let err = chat::send_query(&session, " \n\t ").await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Validation(ValidationError::EmptyQuery)
    ));
    assert!(chat::get_messages(&session).is_empty());
}

// ─── Degraded fallback ──────────────────────────────────────────────────────

#[tokio::test]
async fn backend_error_appends_placeholder_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.scopes().toggle("s1");
    let outcome = chat::send_query(&session, "hello").await.unwrap();

    match &outcome {
        QueryOutcome::Degraded { message, reason } => {
            assert_eq!(message.content, DEGRADED_ANSWER);
            assert_eq!(reason, "HTTP 500");
            let results = message.results();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].title.as_deref(), Some("Example Result"));
            assert_eq!(results[0].url, "https://example.com");
            assert_eq!(results[0].score, Some(0.85));
            assert_eq!(results[0].version.as_deref(), Some("1"));
        }
        other => panic!("expected degraded outcome, got {other:?}"),
    }
    assert_eq!(chat::get_messages(&session).len(), 2);
}

#[tokio::test]
async fn unreachable_backend_degrades() {
    let settings = Settings {
        api_endpoint: "http://127.0.0.1:19999".into(),
        ..Default::default()
    };
    let session = Session::with_settings(Database::in_memory().unwrap(), settings);
    session.scopes().toggle("s1");

    let outcome = chat::send_query(&session, "hello").await.unwrap();
    assert!(outcome.is_degraded());
    let roles: Vec<Role> = chat::get_messages(&session).iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

// ─── Concurrency ────────────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_queries_append_in_completion_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({"query": "slow"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "slow answer", "results": []}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({"query": "fast"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": "fast answer", "results": []})),
        )
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.scopes().toggle("s1");

    let (slow, fast) = tokio::join!(chat::send_query(&session, "slow"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        chat::send_query(&session, "fast").await
    });
    assert!(!slow.unwrap().is_degraded());
    assert!(!fast.unwrap().is_degraded());

    let contents: Vec<String> = chat::get_messages(&session)
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["slow", "fast", "fast answer", "slow answer"]);
}

#[tokio::test]
async fn backend_validation_message_becomes_degraded_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid scope: x"})))
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.scopes().toggle("x");
    match chat::send_query(&session, "hello").await.unwrap() {
        QueryOutcome::Degraded { reason, .. } => assert_eq!(reason, "Invalid scope: x"),
        other => panic!("expected degraded outcome, got {other:?}"),
    }
}

// ─── Connectivity ───────────────────────────────────────────────────────────

#[tokio::test]
async fn offline_state_does_not_block_queries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "still here"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let tracker = session.connectivity();
    let ticket = tracker.begin();
    tracker.finish(ticket, Connectivity::Offline);
    session.scopes().toggle("s1");

    let outcome = chat::send_query(&session, "hello").await.unwrap();
    assert!(!outcome.is_degraded());
    assert_eq!(outcome.message().content, "still here");
    assert_eq!(tracker.current(), Connectivity::Offline);
}
