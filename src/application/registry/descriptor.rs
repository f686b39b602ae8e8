use std::{fmt, sync::Arc};

use crate::domain::types::TemplateKind;

use super::super::template::Template;
use super::blocks::{CssBlock, FileBlock, JsBlock};

/// A registered template: its key, kind, implementation and the areas and
/// asset blocks it declares.
#[derive(Clone)]
pub struct TemplateDescriptor {
    key: String,
    kind: TemplateKind,
    template: Arc<dyn Template>,
    areas: Vec<String>,
    css: Vec<CssBlock>,
    js: Vec<JsBlock>,
    files: Vec<FileBlock>,
}

impl TemplateDescriptor {
    pub fn new(key: impl Into<String>, kind: TemplateKind, template: impl Template + 'static) -> Self {
        Self::from_arc(key, kind, Arc::new(template))
    }

    pub fn from_arc(key: impl Into<String>, kind: TemplateKind, template: Arc<dyn Template>) -> Self {
        Self {
            key: key.into(),
            kind,
            template,
            areas: Vec::new(),
            css: Vec::new(),
            js: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn page(key: impl Into<String>, template: impl Template + 'static) -> Self {
        Self::new(key, TemplateKind::Page, template)
    }

    pub fn component(key: impl Into<String>, template: impl Template + 'static) -> Self {
        Self::new(key, TemplateKind::Component, template)
    }

    /// Areas hydrated when the templates metadata has no entry for this key.
    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_css(mut self, block: CssBlock) -> Self {
        self.css.push(block);
        self
    }

    pub fn with_js(mut self, block: JsBlock) -> Self {
        self.js.push(block);
        self
    }

    pub fn with_file(mut self, block: FileBlock) -> Self {
        self.files.push(block);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn is_page(&self) -> bool {
        self.kind == TemplateKind::Page
    }

    pub fn template(&self) -> &Arc<dyn Template> {
        &self.template
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn css(&self) -> &[CssBlock] {
        &self.css
    }

    pub fn js(&self) -> &[JsBlock] {
        &self.js
    }

    pub fn files(&self) -> &[FileBlock] {
        &self.files
    }

    pub fn css_block_names(&self) -> Vec<String> {
        self.css.iter().map(|block| block.name.clone()).collect()
    }

    pub fn js_block_names(&self) -> Vec<String> {
        self.js.iter().map(|block| block.name.clone()).collect()
    }
}

impl fmt::Debug for TemplateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDescriptor")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("areas", &self.areas)
            .field("css", &self.css_block_names())
            .field("js", &self.js_block_names())
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}
