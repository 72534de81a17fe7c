use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::CommandError;
use crate::db::models::Settings;
use crate::session::Session;

/// Where a key update ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySync {
    /// Stored locally and accepted by the backend.
    Synced,
    /// Stored locally; the backend could not be reached or refused.
    LocalOnly,
}

/// Current settings with API keys masked.
pub fn get_settings(session: &Session) -> Settings {
    session.settings().masked()
}

/// Persists `settings` as a whole and applies it to the session.
pub fn save_settings(session: &Session, settings: Settings) -> Result<(), CommandError> {
    session.db().save_settings(&settings)?;
    info!(endpoint = %settings.api_endpoint, "settings saved");
    session.apply_settings(settings);
    Ok(())
}

/// Overlays the keys in `patch` onto the current settings and saves the result.
pub fn update_settings(session: &Session, patch: &Value) -> Result<Settings, CommandError> {
    let merged = session.settings().merged(patch)?;
    save_settings(session, merged.clone())?;
    Ok(merged)
}

/// Saves provider keys locally, then forwards them to the backend.
pub async fn save_api_keys(session: &Session, settings: Settings) -> Result<KeySync, CommandError> {
    let keys = settings.api_keys();
    save_settings(session, settings)?;
    match session.client().push_api_keys(&keys).await {
        Ok(()) => Ok(KeySync::Synced),
        Err(e) => {
            warn!(error = %e, "API keys saved locally only");
            Ok(KeySync::LocalOnly)
        }
    }
}

/// Snapshot of cached scopes and settings for backup.
pub fn export_data(session: &Session) -> Value {
    json!({
        "scopes": session.scopes().scopes(),
        "settings": session.settings(),
        "exportDate": Utc::now().to_rfc3339(),
    })
}

/// Merges the `settings` object of an exported document into the current
/// settings. Other sections are ignored.
pub fn import_data(session: &Session, document: &str) -> Result<Settings, CommandError> {
    let data: Value = serde_json::from_str(document)?;
    match data.get("settings") {
        Some(patch) => update_settings(session, patch),
        None => Ok(session.settings()),
    }
}

/// Drops persisted settings and falls back to defaults.
pub fn clear_cache(session: &Session) -> Result<(), CommandError> {
    session.db().clear()?;
    session.apply_settings(Settings::default());
    info!("local cache cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn session() -> Session {
        Session::open(Database::in_memory().unwrap()).unwrap()
    }

    #[test]
    fn update_persists_merged_settings() {
        let session = session();
        let updated = update_settings(&session, &json!({"showFreshness": false})).unwrap();
        assert!(!updated.show_freshness);
        assert!(!session.db().load_settings().unwrap().show_freshness);
        assert!(!session.settings().show_freshness);
    }

    #[test]
    fn import_merges_settings_section() {
        let session = session();
        let doc = r#"{"scopes": [], "settings": {"apiEndpoint": "http://imported:1"}}"#;
        let settings = import_data(&session, doc).unwrap();
        assert_eq!(settings.api_endpoint, "http://imported:1");
        assert_eq!(session.client().base_url(), "http://imported:1");
    }

    #[test]
    fn import_rejects_malformed_json() {
        let err = import_data(&session(), "{not json").unwrap_err();
        assert!(matches!(err, CommandError::Import(_)));
    }

    #[test]
    fn export_contains_settings_and_date() {
        let exported = export_data(&session());
        assert_eq!(exported["settings"]["llmModel"], "gpt-4o-mini");
        assert!(exported["exportDate"].is_string());
        assert!(exported["scopes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn clear_cache_restores_defaults() {
        let session = session();
        update_settings(&session, &json!({"showScores": false})).unwrap();
        clear_cache(&session).unwrap();
        assert!(session.settings().show_scores);
        assert!(session.db().load_settings().unwrap().show_scores);
    }

    #[test]
    fn displayed_settings_are_masked() {
        let session = session();
        update_settings(&session, &json!({"llmApiKey": "sk-abcdefghijkl"})).unwrap();
        assert_eq!(get_settings(&session).llm_api_key, "sk-a...ijkl");
        assert_eq!(session.settings().llm_api_key, "sk-abcdefghijkl");
    }
}
