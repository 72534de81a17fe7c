use serde::{Deserialize, Deserializer, Serialize};

/// A named, pattern-defined subset of crawled content.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub auto_track: bool,
    #[serde(default)]
    pub page_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /scopes` and `PUT /scopes/:id`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_track: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ScopesResponse {
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

/// Reply to `POST /scopes`.
#[derive(Debug, Deserialize, Clone)]
pub struct CreatedScope {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// A single ranked hit returned by `/query`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    #[serde(default, alias = "doc_id")]
    pub doc_id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default, alias = "chunk_id")]
    pub chunk_id: Option<i64>,
}

impl RetrievalResult {
    /// Title if the backend supplied one, otherwise the url.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RetrievalResult>>,
}

#[derive(Debug, Serialize, Clone)]
pub(crate) struct FeedbackClick<'a> {
    pub scope_id: &'a str,
    pub doc_id: &'a str,
}

/// The recorded text of one chunk at one crawl timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    #[serde(default, alias = "version_ts", deserialize_with = "stamp")]
    pub version_ts: String,
    #[serde(default, alias = "chunk_id")]
    pub chunk_id: i64,
    #[serde(default)]
    pub text: String,
}

fn stamp<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_number(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct VersionsResponse {
    #[serde(default)]
    pub versions: Vec<VersionSnapshot>,
}

/// Aggregate counters from `GET /stats`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub total_scopes: u64,
    pub total_pages: u64,
    pub active_crawls: u64,
    pub pending_updates: u64,
    pub recent_activity: Vec<Activity>,
    pub crawl_queue: Vec<QueuedCrawl>,
    pub freshness_data: Vec<Freshness>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Activity {
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QueuedCrawl {
    pub url: String,
    pub scope: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Freshness {
    pub scope: String,
    pub fresh: u64,
    pub stale: u64,
}

#[derive(Debug, Serialize, Clone)]
pub(crate) struct TrackPage<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize, Clone)]
pub(crate) struct TrackPages<'a> {
    pub urls: &'a [String],
}

/// Reply to `POST /scopes/:id/pages/bulk`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BulkTracked {
    pub total: u64,
    pub queued: u64,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKey {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

/// Body of `POST /config/api-keys`.
#[derive(Debug, Serialize, Clone)]
pub struct ApiKeys {
    pub llm: ProviderKey,
    pub embedding: ProviderKey,
}
