use askama::Template as View;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::{
    editbar::EditBarOptions,
    registry::{CssBlock, TemplateDescriptor},
    scope::{FetchScope, RenderScope},
    template::{Template, TemplateError},
};

use super::{FEED_ITEM, RSS_EXTENSION, render_view};

#[derive(View)]
#[template(path = "stock/feed_item.html")]
struct FeedItemView<'a> {
    level: u8,
    title: &'a str,
    href: &'a str,
    summary: Option<&'a str>,
    published: Option<&'a str>,
    edit_bar: String,
}

#[derive(View)]
#[template(path = "stock/feed_item.xml")]
struct FeedEntryView<'a> {
    title: &'a str,
    href: &'a str,
    summary: Option<&'a str>,
    published: Option<&'a str>,
}

/// Teaser on HTML pages, `<item>` in the RSS variation. The `link` field is
/// resolved through the content API during fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedItem;

pub(super) fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::component(FEED_ITEM, FeedItem).with_css(
        CssBlock::inline("feed-item", ".feed-item{margin-block:1rem}.feed-item time{opacity:.7}")
            .asynchronous(),
    )
}

impl FeedItem {
    fn href<'a>(scope: &RenderScope<'a>) -> &'a str {
        scope
            .fetched()
            .get("href")
            .and_then(Value::as_str)
            .or_else(|| scope.str_field("link"))
            .unwrap_or("#")
    }

    fn title<'a>(scope: &RenderScope<'a>) -> Result<&'a str, TemplateError> {
        scope
            .str_field("title")
            .ok_or_else(|| TemplateError::missing_field("title"))
    }
}

#[async_trait]
impl Template for FeedItem {
    async fn fetch(&self, scope: FetchScope<'_>) -> Result<Value, TemplateError> {
        let Some(link) = scope.str_field("link") else {
            return Ok(Value::Null);
        };
        let href = scope.api().resolve_link(link).await?;
        Ok(json!({ "href": href }))
    }

    fn should_fetch_variation(&self, extension: &str) -> bool {
        extension == RSS_EXTENSION
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError> {
        render_view(&FeedItemView {
            level: scope.heading_level().max(2),
            title: Self::title(scope)?,
            href: Self::href(scope),
            summary: scope.str_field("summary"),
            published: scope.str_field("published"),
            edit_bar: scope.edit_bar(&EditBarOptions::deletable()),
        })
    }

    fn render_variation(
        &self,
        scope: &RenderScope<'_>,
        extension: &str,
    ) -> Result<String, TemplateError> {
        if extension != RSS_EXTENSION {
            return Ok(String::new());
        }
        render_view(&FeedEntryView {
            title: Self::title(scope)?,
            href: Self::href(scope),
            summary: scope.str_field("summary"),
            published: scope.str_field("published"),
        })
    }
}
