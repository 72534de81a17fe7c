//! Command handlers invoked by the UI dispatch layer. Each takes the session
//! context by reference.

pub mod chat;
pub mod lineage;
pub mod scopes;
pub mod settings;
pub mod status;

use serde::Serialize;

use crate::api::ApiError;
use crate::db::StoreError;

/// Rejections raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a query")]
    EmptyQuery,
    #[error("Please select at least one scope")]
    NoScopeSelected,
    #[error("Scope name is required")]
    EmptyScopeName,
    #[error("No result {result} in message {message}")]
    UnknownResult { message: usize, result: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid import: {0}")]
    Import(#[from] serde_json::Error),
}

impl CommandError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CommandError::Validation(_))
    }
}

impl Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
