use tracing::{info, warn};

use super::{CommandError, ValidationError};
use crate::api::models::{BulkTracked, Scope, ScopeDraft};
use crate::api::ApiError;
use crate::session::scopes::parse_patterns;
use crate::session::Session;

/// Scope form contents as entered by the user.
#[derive(Debug, Clone, Default)]
pub struct ScopeForm {
    pub name: String,
    pub description: String,
    /// One pattern per line.
    pub patterns: String,
    pub auto_track: bool,
}

impl ScopeForm {
    fn into_draft(self) -> Result<ScopeDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyScopeName);
        }
        let description = self.description.trim();
        Ok(ScopeDraft {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            patterns: parse_patterns(&self.patterns),
            auto_track: Some(self.auto_track),
        })
    }
}

/// Replaces the cached snapshot with the backend's scope list. On failure the
/// previous snapshot stays in place.
pub async fn load_scopes(session: &Session) -> Result<Vec<Scope>, ApiError> {
    match session.client().list_scopes().await {
        Ok(scopes) => {
            info!(count = scopes.len(), "scopes loaded");
            Ok(session.scopes().replace(scopes).to_vec())
        }
        Err(e) => {
            warn!(error = %e, "failed to load scopes, keeping cached snapshot");
            Err(e)
        }
    }
}

pub fn list_scopes(session: &Session) -> Vec<Scope> {
    session.scopes().scopes().to_vec()
}

/// Flips selection of `id`; returns whether it is now selected.
pub fn toggle_scope(session: &Session, id: &str) -> bool {
    session.scopes().toggle(id)
}

pub fn selected_scopes(session: &Session) -> Vec<String> {
    session.scopes().selected().to_vec()
}

async fn reload_after_change(session: &Session) {
    // The change itself succeeded; a failed refresh only leaves the list stale.
    let _ = load_scopes(session).await;
}

pub async fn create_scope(session: &Session, form: ScopeForm) -> Result<String, CommandError> {
    let draft = form.into_draft()?;
    let created = session.client().create_scope(&draft).await?;
    info!(id = %created.id, name = %draft.name, "scope created");
    reload_after_change(session).await;
    Ok(created.id)
}

pub async fn update_scope(session: &Session, id: &str, form: ScopeForm) -> Result<(), CommandError> {
    let draft = form.into_draft()?;
    session.client().update_scope(id, &draft).await?;
    info!(id, "scope updated");
    reload_after_change(session).await;
    Ok(())
}

pub async fn delete_scope(session: &Session, id: &str) -> Result<(), CommandError> {
    session.client().delete_scope(id).await?;
    info!(id, "scope deleted");
    reload_after_change(session).await;
    Ok(())
}

pub async fn track_page(session: &Session, scope_id: &str, url: &str) -> Result<(), CommandError> {
    session.client().track_page(scope_id, url).await?;
    info!(scope_id, url, "page tracked");
    Ok(())
}

pub async fn track_pages(
    session: &Session,
    scope_id: &str,
    urls: &[String],
) -> Result<BulkTracked, CommandError> {
    let tracked = session.client().track_pages(scope_id, urls).await?;
    info!(scope_id, total = tracked.total, queued = tracked.queued, "pages tracked");
    Ok(tracked)
}
