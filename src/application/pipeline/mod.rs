//! The render pipeline: hydrate, fetch, context, head assembly, render.

mod context;
mod fetch;
mod render;

use std::{sync::Arc, time::Instant};

use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::{components::PageRecord, types::RenderMode};

use super::{
    api::{ApiError, ContentApi, RequestContext},
    editbar::{EditBarRenderer, HtmlEditBars},
    head::assemble_head,
    hydrate::{HydrateError, hydrate},
    registry::TemplateRegistry,
    session::{ErrorSink, RenderOptions, RenderSession, TracingErrorSink},
    tree::ComponentTree,
};

pub use render::ERROR_PLACEHOLDER;

/// Status requested from the response hooks when the page root fails.
pub const ROOT_FAILURE_STATUS: u16 = 500;

/// Failures that escape a render. Node-level errors never do; they degrade
/// to empty or placeholder output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Hydrate(#[from] HydrateError),
    #[error("failed to load templates metadata: {0}")]
    Metadata(#[source] ApiError),
}

/// Result of one render, with the tree kept for inspection.
#[derive(Debug)]
pub struct RenderOutcome {
    pub body: String,
    pub tree: ComponentTree,
    /// The page root failed; the body is empty and an error status was requested.
    pub aborted: bool,
}

#[derive(Clone)]
pub struct Renderer {
    registry: Arc<TemplateRegistry>,
    edit_bars: Arc<dyn EditBarRenderer>,
    errors: Arc<dyn ErrorSink>,
    options: Arc<RenderOptions>,
}

impl Renderer {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self {
            registry,
            edit_bars: Arc::new(HtmlEditBars),
            errors: Arc::new(TracingErrorSink),
            options: Arc::new(RenderOptions::default()),
        }
    }

    pub fn with_edit_bars(mut self, edit_bars: Arc<dyn EditBarRenderer>) -> Self {
        self.edit_bars = edit_bars;
        self
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a page and return the body. An empty body with status 500
    /// requested through the request's hooks means the page root failed.
    pub async fn render_page(
        &self,
        api: Arc<dyn ContentApi>,
        request: RequestContext,
        page: &PageRecord,
        extension: &str,
        mode: RenderMode,
    ) -> Result<String, RenderError> {
        self.render(api, request, page, extension, mode)
            .await
            .map(|outcome| outcome.body)
    }

    pub async fn render(
        &self,
        api: Arc<dyn ContentApi>,
        request: RequestContext,
        page: &PageRecord,
        extension: &str,
        mode: RenderMode,
    ) -> Result<RenderOutcome, RenderError> {
        let span = info_span!(
            "render_page",
            page = %page.id,
            extension,
            mode = mode.as_str()
        );
        self.render_inner(api, request, page, extension, mode)
            .instrument(span)
            .await
    }

    async fn render_inner(
        &self,
        api: Arc<dyn ContentApi>,
        request: RequestContext,
        page: &PageRecord,
        extension: &str,
        mode: RenderMode,
    ) -> Result<RenderOutcome, RenderError> {
        let started_at = Instant::now();
        let metadata = api
            .fetch_templates_metadata()
            .await
            .map_err(RenderError::Metadata)?;

        let mut tree = hydrate(page, &self.registry, &metadata, mode, extension)?;
        let session = RenderSession {
            api,
            request,
            edit_bars: Arc::clone(&self.edit_bars),
            errors: Arc::clone(&self.errors),
            options: Arc::clone(&self.options),
        };

        let master = fetch::run(&mut tree, &self.registry, &metadata, &session).await;
        if tree.root_failed() {
            return Ok(abort(tree, &session, "fetch"));
        }

        if !tree.is_variation() {
            context::run(&mut tree, &session).await;
            if tree.root_failed() {
                return Ok(abort(tree, &session, "context"));
            }

            let head = assemble_head(&tree, &master, &self.registry, &self.options);
            debug!(blocks_bytes = head.len(), "assembled head content");
            tree.page_mut().head_content = head;
        }

        let body = render::run(&mut tree, &session);
        if tree.root_failed() {
            return Ok(abort(tree, &session, "render"));
        }

        info!(
            target = "application::pipeline::render_page",
            nodes = tree.len(),
            bytes = body.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "page rendered"
        );
        Ok(RenderOutcome {
            body,
            tree,
            aborted: false,
        })
    }
}

fn abort(tree: ComponentTree, session: &RenderSession, phase: &'static str) -> RenderOutcome {
    warn!(phase, "page root failed; suppressing body");
    session.request().hooks.set_status(ROOT_FAILURE_STATUS);
    RenderOutcome {
        body: String::new(),
        tree,
        aborted: true,
    }
}
