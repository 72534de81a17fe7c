use std::time::Duration;

use futures::future::join;
use tracing::{debug, warn};

use super::scopes::load_scopes;
use crate::api::models::Stats;
use crate::api::{ApiError, HEALTH_CHECK_BUDGET};
use crate::session::{Connectivity, Session};

/// Probes the backend with the standard budget.
pub async fn check_health(session: &Session) -> Connectivity {
    check_health_within(session, HEALTH_CHECK_BUDGET).await
}

/// Probes the backend and records the result unless a newer probe has already
/// reported. Returns the session's connectivity afterwards.
pub async fn check_health_within(session: &Session, budget: Duration) -> Connectivity {
    let tracker = session.connectivity();
    let ticket = tracker.begin();
    let state = match session
        .client()
        .health(budget, session.shutdown_token())
        .await
    {
        Ok(()) => Connectivity::Online,
        Err(ApiError::Cancelled) => {
            debug!(ticket, "health probe abandoned");
            return tracker.current();
        }
        Err(e) => {
            warn!(ticket, error = %e, "backend offline");
            Connectivity::Offline
        }
    };
    if !tracker.finish(ticket, state) {
        debug!(ticket, ?state, "stale health probe ignored");
    }
    tracker.current()
}

/// Refreshes cached stats. Only backend replies are cached. On failure the
/// last reply is returned; if there never was one, a zeroed set counting the
/// currently cached scopes is built fresh each time.
pub async fn load_stats(session: &Session) -> Stats {
    match session.client().stats().await {
        Ok(stats) => {
            session.set_stats(stats.clone());
            stats
        }
        Err(e) => {
            warn!(error = %e, "failed to load stats");
            session.stats().unwrap_or_else(|| fallback_stats(session))
        }
    }
}

fn fallback_stats(session: &Session) -> Stats {
    let scopes = session.scopes();
    Stats {
        total_scopes: scopes.scopes().len() as u64,
        total_pages: scopes.total_pages(),
        ..Default::default()
    }
}

/// Health, scopes and stats, as on opening a view. Stats wait for the scope
/// list so a fallback counts the freshly loaded scopes.
pub async fn refresh(session: &Session) -> Connectivity {
    let (connectivity, _) = join(check_health(session), async {
        let _ = load_scopes(session).await;
        load_stats(session).await
    })
    .await;
    connectivity
}
