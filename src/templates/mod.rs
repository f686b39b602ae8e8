//! Stock templates shipped with the renderer.
//!
//! They cover a document shell with header inheritance and an RSS channel,
//! headed sections, rich text, navigation menus and feed items. Hosts
//! register them next to their own templates with [`register_stock`].

mod feed_item;
mod navigation;
mod page;
mod rich_text;
mod section;

use crate::application::{
    registry::{RegistryError, TemplateDescriptor, TemplateRegistry},
    template::TemplateError,
};

pub use feed_item::FeedItem;
pub use navigation::Navigation;
pub use page::StandardPage;
pub use rich_text::RichText;
pub use section::Section;

pub const STANDARD_PAGE: &str = "standard-page";
pub const SECTION: &str = "section";
pub const RICH_TEXT: &str = "rich-text";
pub const NAVIGATION: &str = "navigation";
pub const FEED_ITEM: &str = "feed-item";

pub const RSS_EXTENSION: &str = "rss";

pub fn stock_templates() -> Vec<TemplateDescriptor> {
    vec![
        page::descriptor(),
        section::descriptor(),
        rich_text::descriptor(),
        navigation::descriptor(),
        feed_item::descriptor(),
    ]
}

/// Register every stock template; returns how many were newly added.
pub fn register_stock(registry: &mut TemplateRegistry) -> Result<usize, RegistryError> {
    registry.register_all(stock_templates())
}

fn render_view(view: &impl askama::Template) -> Result<String, TemplateError> {
    view.render()
        .map_err(|err| TemplateError::message(format!("view rendering failed: {err}")))
}
