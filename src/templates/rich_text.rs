use crate::{
    application::{
        editbar::EditBarOptions,
        registry::TemplateDescriptor,
        scope::RenderScope,
        template::{Template, TemplateError},
    },
    util::html::escape_html,
};

use super::RICH_TEXT;

/// Trusted `html` from the editor, or plain `text` escaped on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichText;

pub(super) fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::component(RICH_TEXT, RichText)
}

impl Template for RichText {
    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError> {
        let body = match (scope.str_field("html"), scope.str_field("text")) {
            (Some(html), _) => html.to_string(),
            (None, Some(text)) => format!("<p>{}</p>", escape_html(text)),
            (None, None) => return Err(TemplateError::missing_field("html")),
        };

        Ok(format!(
            "<div class=\"rich-text\">{}{body}</div>",
            scope.edit_bar(&EditBarOptions::deletable())
        ))
    }
}
