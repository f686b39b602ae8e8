use askama::Template as View;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    application::{
        editbar::{EditBarOptions, NewBarOptions},
        registry::{CssBlock, TemplateDescriptor},
        scope::{FetchScope, RenderScope},
        template::{Template, TemplateError},
        tree::NodeRef,
    },
    domain::types::{InheritMode, RenderMode},
};

use super::{RSS_EXTENSION, STANDARD_PAGE, render_view};

const HEADER: &str = "header";
const MAIN: &str = "main";
const FOOTER: &str = "footer";

const PAGE_CSS: &str = "\
.mosaic-page{margin:0;font-family:system-ui,sans-serif;line-height:1.5}\
.page-main{max-width:72ch;margin:0 auto;padding:1rem}";

const PAGE_EDITING_CSS: &str = "\
edit-bar,new-bar{display:block;min-height:1.5rem;outline:1px dashed #8a8a8a}\
.mosaic-component-error{padding:.5rem;border:1px solid #c0392b;color:#c0392b}";

#[derive(View)]
#[template(path = "stock/page.html")]
struct PageView<'a> {
    lang: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    canonical: Option<&'a str>,
    head: &'a str,
    edit_bar: String,
    header: String,
    header_bar: String,
    main: String,
    main_bar: String,
    footer: String,
    footer_bar: String,
}

#[derive(View)]
#[template(path = "stock/channel.xml")]
struct ChannelView<'a> {
    title: &'a str,
    link: String,
    description: Option<&'a str>,
    items: String,
}

/// Document shell. Optionally inherits its header area from the page named
/// by `parentPage`, placed according to `inheritHeader` (default `top`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPage;

pub(super) fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::page(STANDARD_PAGE, StandardPage)
        .with_areas([HEADER, MAIN, FOOTER])
        .with_css(CssBlock::inline("page", PAGE_CSS))
        .with_css(CssBlock::inline("page-editing", PAGE_EDITING_CSS).for_edit_bar())
}

impl StandardPage {
    fn title<'a>(scope: &RenderScope<'a>) -> &'a str {
        scope
            .str_field("title")
            .unwrap_or_else(|| scope.page().id.as_str())
    }
}

#[async_trait]
impl Template for StandardPage {
    async fn fetch(&self, scope: FetchScope<'_>) -> Result<Value, TemplateError> {
        let Some(parent_id) = scope.str_field("parentPage") else {
            return Ok(Value::Null);
        };

        let mode = match scope.str_field("inheritHeader") {
            Some(raw) => raw
                .parse::<InheritMode>()
                .map_err(|err| TemplateError::invalid_field("inheritHeader", err.to_string()))?,
            None => InheritMode::Top,
        };

        let Some(parent) = scope.api().fetch_page(parent_id).await? else {
            scope.pass_error(&TemplateError::invalid_field(
                "parentPage",
                format!("page `{parent_id}` does not exist"),
            ));
            return Ok(Value::Null);
        };

        let header = parent.content.area(HEADER).to_vec();
        if !header.is_empty() {
            scope.register_inherited(HEADER, header, mode, parent.id.as_str());
        }

        Ok(json!({ "parent": { "id": parent.id, "url": parent.url } }))
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError> {
        if scope.mode() != RenderMode::Live {
            scope.add_header("cache-control", Some("no-store"));
        }

        let bar = |area: &str| scope.new_bar(area, &NewBarOptions::default());
        let page = scope.page();
        render_view(&PageView {
            lang: scope.str_field("lang").unwrap_or("en"),
            title: Self::title(scope),
            description: scope.str_field("description"),
            canonical: page.url.as_deref(),
            head: &page.head_content,
            edit_bar: scope.edit_bar(&EditBarOptions::default()),
            header: scope.area_output(HEADER),
            header_bar: bar(HEADER),
            main: scope.area_output(MAIN),
            main_bar: bar(MAIN),
            footer: scope.area_output(FOOTER),
            footer_bar: bar(FOOTER),
        })
    }

    fn render_variation(
        &self,
        scope: &RenderScope<'_>,
        extension: &str,
    ) -> Result<String, TemplateError> {
        if extension != RSS_EXTENSION {
            return Err(TemplateError::message(format!(
                "no `{extension}` variation for {STANDARD_PAGE}"
            )));
        }

        let page = scope.page();
        render_view(&ChannelView {
            title: Self::title(scope),
            link: page.url.clone().unwrap_or_else(|| format!("/{}", page.id)),
            description: scope.str_field("description"),
            items: scope.area_output(MAIN),
        })
    }

    fn css_blocks(&self, node: NodeRef<'_>) -> Vec<String> {
        let mut blocks = vec!["page".to_string()];
        if node.mode().is_edit() {
            blocks.push("page-editing".to_string());
        }
        blocks
    }
}
