#![allow(dead_code)]

use std::time::Duration;

use owlerlite_lib::db::models::Settings;
use owlerlite_lib::db::Database;
use owlerlite_lib::session::Session;
use wiremock::MockServer;

/// A session pointed at `server`, backed by an in-memory settings store.
pub fn session_for(server: &MockServer) -> Session {
    let settings = Settings {
        api_endpoint: server.uri(),
        ..Default::default()
    };
    Session::with_settings(
        Database::in_memory().expect("in-memory store"),
        settings,
    )
}

/// Waits until `server` has seen `count` requests or two seconds pass.
pub async fn wait_for_requests(server: &MockServer, count: usize) -> usize {
    let mut seen = 0;
    for _ in 0..100 {
        seen = server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default();
        if seen >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    seen
}
