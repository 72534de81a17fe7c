pub mod api;
pub mod commands;
pub mod db;
pub mod feedback;
pub mod lineage;
pub mod render;
pub mod session;

use std::path::{Path, PathBuf};

use db::{Database, StoreError};
use session::Session;

/// Platform data directory for the settings store, falling back to the
/// working directory.
pub fn default_app_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("owlerlite")
}

/// Opens the settings store under `app_dir` and starts a session from it.
pub fn bootstrap(app_dir: &Path) -> Result<Session, StoreError> {
    let database = Database::new(app_dir)?;
    Session::open(database)
}
