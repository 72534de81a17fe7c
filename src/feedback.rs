//! Best-effort relevance signals. Nothing here reports back to the caller.

use tracing::{debug, warn};

use crate::api::ApiClient;

/// Sends one "used" signal and logs any failure.
pub async fn send_used(client: &ApiClient, scope_id: &str, doc_id: &str) {
    match client.feedback_click(scope_id, doc_id).await {
        Ok(()) => debug!(scope_id, doc_id, "feedback recorded"),
        Err(e) => warn!(scope_id, doc_id, error = %e, "feedback signal dropped"),
    }
}

/// Fires [`send_used`] in the background. Repeated calls send repeated signals.
pub fn record_used(client: ApiClient, scope_id: String, doc_id: String) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { send_used(&client, &scope_id, &doc_id).await });
        }
        Err(_) => warn!(scope_id, doc_id, "no async runtime, feedback signal dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_backend_is_swallowed() {
        let client = ApiClient::new("http://127.0.0.1:19999");
        send_used(&client, "scope", "doc").await;
    }

    #[test]
    fn no_runtime_is_not_a_panic() {
        record_used(ApiClient::new("http://127.0.0.1:19999"), "s".into(), "d".into());
    }
}
