//! The capability set every template plugin implements.
//!
//! The pipeline drives templates through three phases: `fetch` (async, may
//! request inherited components), `set_context` (async, per area, top-down)
//! and `render` (sync, bottom-up). Everything except `render` has a default.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{
    api::ApiError,
    scope::{ContextScope, FetchScope, RenderScope},
    tree::{NodeId, NodeRef},
};

/// Deepest heading level the context counter advances to.
pub const MAX_HEADING_LEVEL: u8 = 6;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Message(String),
}

impl TemplateError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Template: Send + Sync {
    /// Gather external data for this node. The returned value is available
    /// to `set_context` and `render` as the node's fetched data.
    async fn fetch(&self, _scope: FetchScope<'_>) -> Result<Value, TemplateError> {
        Ok(Value::Null)
    }

    /// Whether `fetch` should run when rendering a non-HTML extension.
    fn should_fetch_variation(&self, _extension: &str) -> bool {
        false
    }

    /// Derive the context handed to the children of `area`.
    async fn set_context(
        &self,
        _scope: ContextScope<'_>,
        parent: RenderContext,
        _area: &str,
    ) -> Result<RenderContext, TemplateError> {
        Ok(parent)
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError>;

    fn render_variation(
        &self,
        _scope: &RenderScope<'_>,
        _extension: &str,
    ) -> Result<String, TemplateError> {
        Ok(String::new())
    }

    /// CSS block names this node needs; defaults to the blocks declared at
    /// registration.
    fn css_blocks(&self, node: NodeRef<'_>) -> Vec<String> {
        node.descriptor().css_block_names()
    }

    /// JS block names this node needs; defaults to the blocks declared at
    /// registration.
    fn js_blocks(&self, node: NodeRef<'_>) -> Vec<String> {
        node.descriptor().js_block_names()
    }
}

/// Context broadcast from parents to children during the context phase.
/// Each area receives its own copy, so mutations never leak between branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    pub heading_level: u8,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl RenderContext {
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self {
            heading_level: 1,
            headers,
            values: Map::new(),
        }
    }

    /// Advance the heading counter, saturating at `h6`.
    pub fn next_heading_level(mut self) -> Self {
        self.heading_level = self.heading_level.saturating_add(1).min(MAX_HEADING_LEVEL);
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChild {
    pub output: String,
    pub component: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArea {
    pub name: String,
    pub children: Vec<RenderedChild>,
}

/// Children outputs per area, in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedAreas {
    areas: Vec<RenderedArea>,
}

impl RenderedAreas {
    pub fn push(&mut self, area: RenderedArea) {
        self.areas.push(area);
    }

    pub fn get(&self, name: &str) -> &[RenderedChild] {
        self.areas
            .iter()
            .find(|area| area.name == name)
            .map(|area| area.children.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated output of an area's children.
    pub fn output(&self, name: &str) -> String {
        self.get(name)
            .iter()
            .map(|child| child.output.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderedArea> {
        self.areas.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_saturates() {
        let mut ctx = RenderContext::default();
        for _ in 0..10 {
            ctx = ctx.next_heading_level();
        }
        assert_eq!(ctx.heading_level, MAX_HEADING_LEVEL);
    }

    #[test]
    fn cloned_context_is_independent() {
        let parent = RenderContext::default().with_value("theme", "dark");
        let child = parent.clone().next_heading_level().with_value("theme", "light");

        assert_eq!(parent.heading_level, 1);
        assert_eq!(parent.value("theme"), Some(&Value::from("dark")));
        assert_eq!(child.heading_level, 2);
    }

    #[test]
    fn rendered_area_output_concatenates_in_order() {
        let mut areas = RenderedAreas::default();
        areas.push(RenderedArea {
            name: "main".into(),
            children: vec![
                RenderedChild {
                    output: "<a>".into(),
                    component: NodeId::new(1),
                },
                RenderedChild {
                    output: "<b>".into(),
                    component: NodeId::new(2),
                },
            ],
        });

        assert_eq!(areas.output("main"), "<a><b>");
        assert!(areas.get("aside").is_empty());
    }
}
