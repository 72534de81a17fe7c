pub mod models;

use models::Settings;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

const SETTINGS_KEY: &str = "settings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Settings encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local persistence for the settings object.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(app_dir)?;
        let db_path = app_dir.join("owlerlite.db");
        info!(path = %db_path.display(), "opening settings store");
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn().execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the stored settings merged over defaults. A missing or unreadable
    /// document yields the defaults.
    pub fn load_settings(&self) -> Result<Settings, StoreError> {
        let stored: Option<String> = {
            let conn = self.conn();
            let result = conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get(0),
            );
            match result {
                Ok(val) => Some(val),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };
        let Some(stored) = stored else {
            return Ok(Settings::default());
        };
        match serde_json::from_str(&stored) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(error = %e, "stored settings unreadable, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Replaces the stored settings document as a whole.
    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let value = serde_json::to_string(settings)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![SETTINGS_KEY, value],
        )?;
        Ok(())
    }

    /// Drops every locally persisted value.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn().execute("DELETE FROM settings", [])?;
        Ok(())
    }
}
