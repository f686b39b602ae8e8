//! Per-request collaborators threaded through every render phase.

use std::{sync::Arc, time::Duration};

use tracing::{error, warn};

use crate::{config::RenderSettings, domain::types::RenderPhase};

use super::{
    api::{ContentApi, RequestContext},
    editbar::EditBarRenderer,
    template::TemplateError,
};

/// Receives node-level failures. The pipeline marks the node `Failed`
/// whether or not a sink does anything with the report.
pub trait ErrorSink: Send + Sync {
    fn log_error(&self, path: &str, phase: RenderPhase, error: &TemplateError);

    /// Recoverable failures a template reports without failing its node.
    fn pass_error(&self, path: &str, error: &TemplateError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn log_error(&self, path: &str, phase: RenderPhase, error: &TemplateError) {
        error!(path, %phase, error = %error, "component failed");
    }

    fn pass_error(&self, path: &str, error: &TemplateError) {
        warn!(path, error = %error, "component reported an error");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub editor_script: String,
    pub editor_stylesheet: String,
    pub css_prefix: String,
    pub js_prefix: String,
    pub files_prefix: String,
    /// Upper bound for a single node's `fetch`; unbounded when `None`.
    pub fetch_timeout: Option<Duration>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            editor_script: "/_editor/editor.js".to_string(),
            editor_stylesheet: "/_editor/editor.css".to_string(),
            css_prefix: "/_css".to_string(),
            js_prefix: "/_js".to_string(),
            files_prefix: "/_files".to_string(),
            fetch_timeout: None,
        }
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            editor_script: settings.editor_script.clone(),
            editor_stylesheet: settings.editor_stylesheet.clone(),
            css_prefix: settings.css_prefix.clone(),
            js_prefix: settings.js_prefix.clone(),
            files_prefix: settings.files_prefix.clone(),
            fetch_timeout: settings.fetch_timeout,
        }
    }
}

/// Everything a render needs besides the tree itself. Built once per
/// request and shared by reference with every phase.
pub struct RenderSession {
    pub(crate) api: Arc<dyn ContentApi>,
    pub(crate) request: RequestContext,
    pub(crate) edit_bars: Arc<dyn EditBarRenderer>,
    pub(crate) errors: Arc<dyn ErrorSink>,
    pub(crate) options: Arc<RenderOptions>,
}

impl RenderSession {
    pub fn api(&self) -> &dyn ContentApi {
        self.api.as_ref()
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub(crate) fn log_error(&self, path: &str, phase: RenderPhase, error: &TemplateError) {
        self.errors.log_error(path, phase, error);
    }

    pub(crate) fn pass_error(&self, path: &str, error: &TemplateError) {
        self.errors.pass_error(path, error);
    }
}
