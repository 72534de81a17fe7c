//! Typed client for the retrieval backend.
//!
//! Every call funnels through one retry-free primitive that attaches the JSON
//! content type and normalizes non-success statuses into [`ApiError::Backend`].

pub mod models;

use std::time::Duration;

use models::{
    ApiKeys, BulkTracked, CreatedScope, FeedbackClick, QueryRequest, QueryResponse, Scope,
    ScopeDraft, ScopesResponse, Stats, TrackPage, TrackPages, VersionSnapshot, VersionsResponse,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Budget for a single `/health` probe.
pub const HEALTH_CHECK_BUDGET: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status. `message` is the backend's own error text when the
    /// body could be parsed, otherwise `HTTP <status>`.
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error.or(self.message).or(match self.detail {
            Some(Value::String(detail)) => Some(detail),
            _ => None,
        })
    }
}

/// Thin handle over a shared `reqwest::Client`; cloning is cheap.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Issues one request and returns the decoded JSON body.
    pub async fn request<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request_with_headers(method, endpoint, body, HeaderMap::new())
            .await
    }

    /// Like [`ApiClient::request`], with extra headers layered over the JSON
    /// content type. A caller-supplied `Content-Type` wins.
    pub async fn request_with_headers<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self
            .http
            .request(method, self.url(endpoint))
            .headers(merge_headers(headers));
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Parse(e.to_string()))?;
            req = req.body(bytes);
        }
        self.execute(req).await
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Value, ApiError> {
        let resp = req.send().await?;
        let resp = check_status(resp).await?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn fetch<T, B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.request(method, endpoint, body).await?;
        decode(value)
    }

    /// Probes `/health` within `budget`. Cancelling `cancel` abandons the probe.
    ///
    /// Only the status line counts; the body is never read, so a backend that
    /// stalls after its headers cannot hold the probe past `budget`.
    pub async fn health(&self, budget: Duration, cancel: &CancellationToken) -> Result<(), ApiError> {
        let probe = self.http.get(self.url("/health")).send();
        let resp = tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            res = tokio::time::timeout(budget, probe) => {
                res.map_err(|_| ApiError::Timeout(budget))??
            }
        };
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        warn!(status = status.as_u16(), "health probe failed");
        Err(ApiError::Backend {
            status: status.as_u16(),
            message: format!("HTTP {}", status.as_u16()),
        })
    }

    pub async fn list_scopes(&self) -> Result<Vec<Scope>, ApiError> {
        let resp: ScopesResponse = self.fetch(Method::GET, "/scopes", None::<&()>).await?;
        Ok(resp.scopes)
    }

    pub async fn create_scope(&self, draft: &ScopeDraft) -> Result<CreatedScope, ApiError> {
        self.fetch(Method::POST, "/scopes", Some(draft)).await
    }

    pub async fn update_scope(&self, id: &str, draft: &ScopeDraft) -> Result<(), ApiError> {
        self.request(Method::PUT, &format!("/scopes/{id}"), Some(draft))
            .await
            .map(|_| ())
    }

    pub async fn delete_scope(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("/scopes/{id}"), None::<&()>)
            .await
            .map(|_| ())
    }

    pub async fn track_page(&self, scope_id: &str, url: &str) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            &format!("/scopes/{scope_id}/pages"),
            Some(&TrackPage { url }),
        )
        .await
        .map(|_| ())
    }

    pub async fn track_pages(&self, scope_id: &str, urls: &[String]) -> Result<BulkTracked, ApiError> {
        self.fetch(
            Method::POST,
            &format!("/scopes/{scope_id}/pages/bulk"),
            Some(&TrackPages { urls }),
        )
        .await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.fetch(Method::POST, "/query", Some(request)).await
    }

    pub async fn feedback_click(&self, scope_id: &str, doc_id: &str) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            "/feedback/click",
            Some(&FeedbackClick { scope_id, doc_id }),
        )
        .await
        .map(|_| ())
    }

    /// Lineage of one chunk. An absent chunk id is sent as an empty string.
    pub async fn versions(&self, url: &str, chunk_id: Option<i64>) -> Result<Vec<VersionSnapshot>, ApiError> {
        let chunk = chunk_id.map(|c| c.to_string()).unwrap_or_default();
        debug!(url, chunk_id = %chunk, "loading lineage");
        let req = self
            .http
            .get(self.url("/versions"))
            .headers(merge_headers(HeaderMap::new()))
            .query(&[("url", url), ("chunk_id", chunk.as_str())]);
        let resp: VersionsResponse = decode(self.execute(req).await?)?;
        Ok(resp.versions)
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.fetch(Method::GET, "/stats", None::<&()>).await
    }

    pub async fn push_api_keys(&self, keys: &ApiKeys) -> Result<(), ApiError> {
        self.request(Method::POST, "/config/api-keys", Some(keys))
            .await
            .map(|_| ())
    }
}

fn merge_headers(extra: HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.extend(extra);
    headers
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    warn!(status = status.as_u16(), %message, "backend returned an error");
    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    // Endpoints that answer with an empty body decode as their defaults.
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}
