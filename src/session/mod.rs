//! Session context owned by a view and handed by reference to command handlers.
//!
//! State lives behind short-lived locks that are never held across an
//! `.await`, so overlapping commands interleave at their network calls and
//! append in completion order.

pub mod conversation;
pub mod scopes;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::models::Stats;
use crate::api::ApiClient;
use crate::db::models::Settings;
use crate::db::Database;
use crate::lineage::LineageView;
use conversation::ConversationLog;
use scopes::ScopeRegistry;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Connectivity as reported by health probes. Each probe takes a ticket when
/// it starts; a completion only applies if no later-started probe has already
/// applied its own result.
#[derive(Debug, Default)]
pub struct ConnectivityTracker {
    inner: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    issued: u64,
    applied: u64,
    state: Connectivity,
}

impl ConnectivityTracker {
    pub fn begin(&self) -> u64 {
        let mut inner = lock(&self.inner);
        inner.issued += 1;
        inner.issued
    }

    /// Records the outcome of probe `ticket`; returns whether it was applied.
    pub fn finish(&self, ticket: u64, state: Connectivity) -> bool {
        let mut inner = lock(&self.inner);
        if ticket <= inner.applied {
            return false;
        }
        inner.applied = ticket;
        inner.state = state;
        true
    }

    pub fn current(&self) -> Connectivity {
        lock(&self.inner).state
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Session {
    db: Database,
    settings: Mutex<Settings>,
    client: Mutex<ApiClient>,
    scopes: Mutex<ScopeRegistry>,
    conversation: Mutex<ConversationLog>,
    stats: Mutex<Option<Stats>>,
    lineage: Mutex<Option<LineageView>>,
    connectivity: ConnectivityTracker,
    shutdown: CancellationToken,
}

impl Session {
    /// Starts a session from the persisted settings. Selection and
    /// conversation always start empty.
    pub fn open(db: Database) -> Result<Self, crate::db::StoreError> {
        let settings = db.load_settings()?;
        Ok(Self::with_settings(db, settings))
    }

    pub fn with_settings(db: Database, settings: Settings) -> Self {
        let client = ApiClient::new(&settings.api_endpoint);
        Self {
            db,
            settings: Mutex::new(settings),
            client: Mutex::new(client),
            scopes: Mutex::new(ScopeRegistry::new()),
            conversation: Mutex::new(ConversationLog::new()),
            stats: Mutex::new(None),
            lineage: Mutex::new(None),
            connectivity: ConnectivityTracker::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> Settings {
        lock(&self.settings).clone()
    }

    /// Swaps in new settings and points the client at the new endpoint.
    pub(crate) fn apply_settings(&self, settings: Settings) {
        let mut client = lock(&self.client);
        if client.base_url() != settings.api_endpoint.trim_end_matches('/') {
            *client = ApiClient::new(&settings.api_endpoint);
        }
        *lock(&self.settings) = settings;
    }

    pub fn client(&self) -> ApiClient {
        lock(&self.client).clone()
    }

    pub fn scopes(&self) -> MutexGuard<'_, ScopeRegistry> {
        lock(&self.scopes)
    }

    pub fn conversation(&self) -> MutexGuard<'_, ConversationLog> {
        lock(&self.conversation)
    }

    pub fn stats(&self) -> Option<Stats> {
        lock(&self.stats).clone()
    }

    pub(crate) fn set_stats(&self, stats: Stats) {
        *lock(&self.stats) = Some(stats);
    }

    pub fn lineage(&self) -> Option<LineageView> {
        lock(&self.lineage).clone()
    }

    pub(crate) fn set_lineage(&self, view: LineageView) {
        *lock(&self.lineage) = Some(view);
    }

    pub fn connectivity(&self) -> &ConnectivityTracker {
        &self.connectivity
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Abandons pending health probes. Other in-flight work runs to completion.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Clears the conversation and selection, as a fresh view would.
    pub fn reset(&self) {
        self.conversation().reset();
        self.scopes().clear_selection();
        *lock(&self.lineage) = None;
    }
}
