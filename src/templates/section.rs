use askama::Template as View;
use async_trait::async_trait;

use crate::application::{
    editbar::{EditBarOptions, NewBarOptions},
    registry::{CssBlock, TemplateDescriptor},
    scope::{ContextScope, RenderScope},
    template::{RenderContext, Template, TemplateError},
};

use super::{SECTION, render_view};

const CONTENT: &str = "content";

#[derive(View)]
#[template(path = "stock/section.html")]
struct SectionView<'a> {
    anchor: Option<&'a str>,
    title: Option<&'a str>,
    level: u8,
    edit_bar: String,
    content: String,
    new_bar: String,
}

/// Titled section; its content is rendered one heading level deeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Section;

pub(super) fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::component(SECTION, Section)
        .with_areas([CONTENT])
        .with_css(CssBlock::inline(
            "section",
            ".section{margin-block:2rem}.section>h2,.section>h3{margin-top:0}",
        ))
}

#[async_trait]
impl Template for Section {
    async fn set_context(
        &self,
        scope: ContextScope<'_>,
        parent: RenderContext,
        area: &str,
    ) -> Result<RenderContext, TemplateError> {
        if area == CONTENT && scope.str_field("title").is_some() {
            Ok(parent.next_heading_level())
        } else {
            Ok(parent)
        }
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError> {
        render_view(&SectionView {
            anchor: scope.str_field("anchor"),
            title: scope.str_field("title"),
            level: scope.heading_level(),
            edit_bar: scope.edit_bar(&EditBarOptions::deletable()),
            content: scope.area_output(CONTENT),
            new_bar: scope.new_bar(CONTENT, &NewBarOptions::default()),
        })
    }

    /// Sections are transparent in feeds.
    fn render_variation(
        &self,
        scope: &RenderScope<'_>,
        _extension: &str,
    ) -> Result<String, TemplateError> {
        Ok(scope.area_output(CONTENT))
    }
}
