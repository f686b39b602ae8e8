//! Collaborators supplied by the hosting server for each render.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{components::PageRecord, metadata::TemplatesMetadata};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("malformed content: {0}")]
    Malformed(String),
    #[error("operation `{0}` is not supported by this content api")]
    Unsupported(String),
}

impl ApiError {
    pub fn upstream(err: impl fmt::Display) -> Self {
        Self::Upstream(err.to_string())
    }

    pub fn malformed(err: impl fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub title: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavigationItem>,
}

/// Upstream content API. The pipeline itself only loads templates metadata;
/// everything else is called from template `fetch` implementations.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn fetch_templates_metadata(&self) -> Result<TemplatesMetadata, ApiError>;

    async fn fetch_page(&self, id: &str) -> Result<Option<PageRecord>, ApiError>;

    async fn get_navigation(
        &self,
        root: &str,
        depth: usize,
    ) -> Result<Vec<NavigationItem>, ApiError>;

    /// Resolve a content link (for example `page:about`) to a public URL.
    async fn resolve_link(&self, link: &str) -> Result<Option<String>, ApiError>;

    /// Named data query for template-specific needs.
    async fn query(&self, name: &str, _variables: Value) -> Result<Value, ApiError> {
        Err(ApiError::Unsupported(name.to_string()))
    }
}

/// Response-side hooks the page root may use to talk to the HTTP layer.
pub trait ResponseHooks: Send + Sync {
    /// `None` removes the header.
    fn add_header(&self, name: &str, value: Option<&str>);

    fn set_status(&self, status: u16);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
}

/// In-memory [`ResponseHooks`] that records what templates asked for.
#[derive(Debug, Default)]
pub struct RecordedResponse {
    inner: Mutex<ResponseMeta>,
}

impl RecordedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ResponseMeta {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResponseHooks for RecordedResponse {
    fn add_header(&self, name: &str, value: Option<&str>) {
        let mut meta = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let name = name.to_ascii_lowercase();
        match value {
            Some(value) => {
                meta.headers.insert(name, value.to_string());
            }
            None => {
                meta.headers.remove(&name);
            }
        }
    }

    fn set_status(&self, status: u16) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status = Some(status);
    }
}

/// Request-scoped inputs: URL, headers, parsed query and response hooks.
#[derive(Clone)]
pub struct RequestContext {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub hooks: Arc<dyn ResponseHooks>,
}

impl RequestContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            hooks: Arc::new(RecordedResponse::new()),
        }
    }

    /// Header names are stored lowercased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ResponseHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}
