//! Markup hooks for the client-side editor.
//!
//! Templates ask their [`RenderScope`](super::scope::RenderScope) for bars;
//! the scope forwards to the injected [`EditBarRenderer`] only in edit mode
//! and only for nodes that are not inherited.

use serde::Serialize;

use crate::util::html::escape_attribute;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBarOptions {
    /// Extra class added to the bar element.
    pub class: Option<String>,
    /// Areas the component may be moved into.
    pub allowed_areas: Vec<String>,
    pub can_delete: bool,
}

impl EditBarOptions {
    pub fn deletable() -> Self {
        Self {
            can_delete: true,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBarOptions {
    pub class: Option<String>,
    /// Template keys offered for insertion; empty offers everything.
    pub templates: Vec<String>,
}

pub trait EditBarRenderer: Send + Sync {
    fn edit_bar(&self, path: &str, label: &str, options: &EditBarOptions) -> String;

    fn new_bar(&self, path: &str, options: &NewBarOptions) -> String;
}

/// Custom-element markup understood by the bundled editor script.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEditBars;

impl EditBarRenderer for HtmlEditBars {
    fn edit_bar(&self, path: &str, label: &str, options: &EditBarOptions) -> String {
        let mut markup = format!(
            "<edit-bar data-path=\"{}\" data-label=\"{}\"",
            escape_attribute(path),
            escape_attribute(label)
        );
        if let Some(class) = &options.class {
            markup.push_str(&format!(" class=\"{}\"", escape_attribute(class)));
        }
        if !options.allowed_areas.is_empty() {
            markup.push_str(&format!(
                " data-areas=\"{}\"",
                escape_attribute(&options.allowed_areas.join(","))
            ));
        }
        if options.can_delete {
            markup.push_str(" data-deletable");
        }
        markup.push_str("></edit-bar>");
        markup
    }

    fn new_bar(&self, path: &str, options: &NewBarOptions) -> String {
        let mut markup = format!("<new-bar data-path=\"{}\"", escape_attribute(path));
        if let Some(class) = &options.class {
            markup.push_str(&format!(" class=\"{}\"", escape_attribute(class)));
        }
        if !options.templates.is_empty() {
            markup.push_str(&format!(
                " data-templates=\"{}\"",
                escape_attribute(&options.templates.join(","))
            ));
        }
        markup.push_str("></new-bar>");
        markup
    }
}
