use serde::{Deserialize, Serialize};

use crate::api::models::{ApiKeys, ProviderKey};

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:7001";

/// Process-wide configuration. Keys missing from a stored object fall back to
/// their defaults, so older documents keep loading.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub api_endpoint: String,
    pub llm_provider: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub embedding_provider: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub show_scores: bool,
    pub show_freshness: bool,
    pub enable_auto_track: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            llm_provider: "openai".to_string(),
            llm_api_key: String::new(),
            llm_model: "gpt-4o-mini".to_string(),
            embedding_provider: "openai".to_string(),
            embedding_api_key: String::new(),
            embedding_model: "text-embedding-3-small".to_string(),
            show_scores: true,
            show_freshness: true,
            enable_auto_track: false,
        }
    }
}

impl Settings {
    /// Overlays the keys present in `patch` onto `self`; unknown keys are ignored.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<Settings, serde_json::Error> {
        let mut current = serde_json::to_value(self)?;
        if let (Some(base), Some(patch)) = (current.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                if base.contains_key(key) {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        serde_json::from_value(current)
    }

    /// Copy safe for display, with API keys masked.
    pub fn masked(&self) -> Settings {
        Settings {
            llm_api_key: mask_key(&self.llm_api_key),
            embedding_api_key: mask_key(&self.embedding_api_key),
            ..self.clone()
        }
    }

    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys {
            llm: ProviderKey {
                provider: self.llm_provider.clone(),
                api_key: self.llm_api_key.clone(),
                model: self.llm_model.clone(),
            },
            embedding: ProviderKey {
                provider: self.embedding_provider.clone(),
                api_key: self.embedding_api_key.clone(),
                model: self.embedding_model.clone(),
            },
        }
    }
}

fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        value.to_string()
    }
}
