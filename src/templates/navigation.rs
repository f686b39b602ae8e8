use async_trait::async_trait;
use serde_json::Value;

use crate::{
    application::{
        api::NavigationItem,
        editbar::EditBarOptions,
        registry::{JsBlock, TemplateDescriptor},
        scope::{FetchScope, RenderScope},
        template::{Template, TemplateError},
    },
    util::html::{escape_attribute, escape_html},
};

use super::NAVIGATION;

const DEFAULT_ROOT: &str = "main";
const DEFAULT_DEPTH: u64 = 1;

const NAVIGATION_JS: &str = "\
document.querySelectorAll('.navigation [aria-expanded]').forEach((toggle)=>{\
toggle.addEventListener('click',()=>{\
toggle.setAttribute('aria-expanded',String(toggle.getAttribute('aria-expanded')!=='true'))})})";

/// Menu built from the content API's navigation tree `root`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigation;

pub(super) fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::component(NAVIGATION, Navigation)
        .with_js(JsBlock::inline("navigation", NAVIGATION_JS).module())
}

fn render_items(items: &[NavigationItem], current: &str, out: &mut String) {
    out.push_str("<ul>");
    for item in items {
        let marker = if item.href == current {
            " aria-current=\"page\""
        } else {
            ""
        };
        out.push_str(&format!(
            "<li><a href=\"{}\"{marker}>{}</a>",
            escape_attribute(&item.href),
            escape_html(&item.title)
        ));
        if !item.children.is_empty() {
            render_items(&item.children, current, out);
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

#[async_trait]
impl Template for Navigation {
    async fn fetch(&self, scope: FetchScope<'_>) -> Result<Value, TemplateError> {
        let root = scope.str_field("root").unwrap_or(DEFAULT_ROOT);
        let depth = scope
            .field("depth")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_DEPTH);
        let depth = usize::try_from(depth)
            .map_err(|_| TemplateError::invalid_field("depth", "out of range"))?;

        let items = scope.api().get_navigation(root, depth).await?;
        serde_json::to_value(items)
            .map_err(|err| TemplateError::message(format!("navigation not serializable: {err}")))
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, TemplateError> {
        let items: Vec<NavigationItem> = match scope.fetched() {
            Value::Null => Vec::new(),
            fetched => serde_json::from_value(fetched.clone())
                .map_err(|err| TemplateError::message(format!("bad navigation data: {err}")))?,
        };

        let mut out = format!(
            "<nav class=\"navigation\">{}",
            scope.edit_bar(&EditBarOptions::default())
        );
        if !items.is_empty() {
            render_items(&items, &scope.request().url, &mut out);
        }
        out.push_str("</nav>");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_current_link_and_nests() {
        let items = vec![NavigationItem {
            title: "Docs & guides".into(),
            href: "/docs".into(),
            children: vec![NavigationItem {
                title: "Start".into(),
                href: "/docs/start".into(),
                children: Vec::new(),
            }],
        }];

        let mut out = String::new();
        render_items(&items, "/docs/start", &mut out);
        assert_eq!(
            out,
            "<ul><li><a href=\"/docs\">Docs &amp; guides</a><ul><li><a href=\"/docs/start\" aria-current=\"page\">Start</a></li></ul></li></ul>"
        );
    }
}
