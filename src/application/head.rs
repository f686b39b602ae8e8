//! Head content: stylesheet, font preload and script tags for every block
//! the rendered nodes depend on.

use tracing::warn;

use crate::util::html::escape_attribute;

use super::{
    registry::{CssBlock, JsBlock, TemplateRegistry, font_mime},
    session::RenderOptions,
    tree::{ComponentTree, NodeId},
};

/// Block names requested by a set of nodes, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedBlocks {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl RequestedBlocks {
    pub fn collect(tree: &ComponentTree, nodes: &[NodeId]) -> Self {
        let mut requested = Self::default();
        for &id in nodes {
            let node = tree.get(id);
            let template = node.template();
            push_unique(&mut requested.css, template.css_blocks(node));
            push_unique(&mut requested.js, template.js_blocks(node));
        }
        requested
    }
}

fn push_unique(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

pub fn assemble_head(
    tree: &ComponentTree,
    nodes: &[NodeId],
    registry: &TemplateRegistry,
    options: &RenderOptions,
) -> String {
    let requested = RequestedBlocks::collect(tree, nodes);

    let mut normal = Vec::new();
    let mut edit_bar = Vec::new();
    for name in &requested.css {
        match registry.css_block(name) {
            Some(block) if block.targets_edit_bar => edit_bar.push(block),
            Some(block) => normal.push(block),
            None => warn!(block = %name, "unknown css block requested"),
        }
    }

    let scripts: Vec<&JsBlock> = requested
        .js
        .iter()
        .filter_map(|name| {
            let block = registry.js_block(name);
            if block.is_none() {
                warn!(block = %name, "unknown js block requested");
            }
            block
        })
        .collect();

    let mut lines = Vec::new();
    if tree.mode().is_edit() {
        lines.extend(editor_bootstrap(&edit_bar, options));
    }
    lines.extend(normal.iter().map(|block| stylesheet_link(block, options)));
    lines.extend(font_preloads(&normal, registry, options));
    lines.extend(scripts.iter().map(|block| script_tag(block, options)));
    lines.join("\n")
}

fn editor_bootstrap(edit_bar: &[&CssBlock], options: &RenderOptions) -> Vec<String> {
    let names: Vec<&str> = edit_bar.iter().map(|block| block.name.as_str()).collect();
    let names = serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string());
    vec![
        format!(
            "<script type=\"module\" src=\"{}\"></script>",
            escape_attribute(&options.editor_script)
        ),
        format!(
            "<link rel=\"stylesheet\" href=\"{}\">",
            escape_attribute(&options.editor_stylesheet)
        ),
        format!("<script>window.mosaicEditBarCss = {names};</script>"),
    ]
}

fn block_url(prefix: &str, name: &str, extension: &str, version: Option<String>) -> String {
    let base = format!("{}/{name}.{extension}", prefix.trim_end_matches('/'));
    match version {
        Some(version) => format!("{base}?v={version}"),
        None => base,
    }
}

fn stylesheet_link(block: &CssBlock, options: &RenderOptions) -> String {
    let href = escape_attribute(&block_url(
        &options.css_prefix,
        &block.name,
        "css",
        block.version.map(|version| version.to_string()),
    ));
    if block.is_async {
        format!(
            "<link rel=\"stylesheet\" href=\"{href}\" media=\"print\" onload=\"this.media='all'\">"
        )
    } else {
        format!("<link rel=\"stylesheet\" href=\"{href}\">")
    }
}

fn font_preloads(
    blocks: &[&CssBlock],
    registry: &TemplateRegistry,
    options: &RenderOptions,
) -> Vec<String> {
    let mut seen = Vec::new();
    for block in blocks {
        for font in block.referenced_fonts() {
            if registry.file(&font).is_some() && !seen.contains(&font) {
                seen.push(font);
            }
        }
    }

    seen.iter()
        .filter_map(|font| {
            let mime = font_mime(font)?;
            let href = format!("{}/{font}", options.files_prefix.trim_end_matches('/'));
            Some(format!(
                "<link rel=\"preload\" href=\"{}\" as=\"font\" type=\"{mime}\" crossorigin>",
                escape_attribute(&href)
            ))
        })
        .collect()
}

fn script_tag(block: &JsBlock, options: &RenderOptions) -> String {
    let src = escape_attribute(&block_url(
        &options.js_prefix,
        &block.name,
        "js",
        block.version.map(|version| version.to_string()),
    ));
    let mut attributes = Vec::new();
    if block.module {
        attributes.push("type=\"module\"");
    }
    if block.nomodule {
        attributes.push("nomodule");
    }
    if block.is_async {
        attributes.push("async");
    } else if !block.module {
        attributes.push("defer");
    }
    format!("<script src=\"{src}\" {}></script>", attributes.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::{BlockSource, FileBlock};

    #[test]
    fn async_stylesheets_use_print_swap() {
        let options = RenderOptions::default();
        let block = CssBlock::inline("hero", "").asynchronous();
        assert_eq!(
            stylesheet_link(&block, &options),
            "<link rel=\"stylesheet\" href=\"/_css/hero.css\" media=\"print\" onload=\"this.media='all'\">"
        );
    }

    #[test]
    fn versioned_urls_carry_the_version() {
        let options = RenderOptions::default();
        let block = CssBlock::inline("grid", "").with_version("1.2.3".parse().expect("version"));
        assert_eq!(
            stylesheet_link(&block, &options),
            "<link rel=\"stylesheet\" href=\"/_css/grid.css?v=1.2.3\">"
        );
    }

    #[test]
    fn script_flags_map_to_attributes() {
        let options = RenderOptions::default();
        assert_eq!(
            script_tag(&JsBlock::inline("app", ""), &options),
            "<script src=\"/_js/app.js\" defer></script>"
        );
        assert_eq!(
            script_tag(&JsBlock::inline("app", "").module(), &options),
            "<script src=\"/_js/app.js\" type=\"module\"></script>"
        );
        assert_eq!(
            script_tag(&JsBlock::inline("legacy", "").nomodule(), &options),
            "<script src=\"/_js/legacy.js\" nomodule defer></script>"
        );
        assert_eq!(
            script_tag(&JsBlock::inline("stats", "").asynchronous(), &options),
            "<script src=\"/_js/stats.js\" async></script>"
        );
    }

    #[test]
    fn preloads_only_registered_fonts() {
        let mut registry = TemplateRegistry::new();
        let options = RenderOptions::default();
        let css = CssBlock::inline(
            "type",
            "@font-face{src:url(inter.woff2)} @font-face{src:url(missing.woff)}",
        );
        registry
            .register(
                crate::application::registry::TemplateDescriptor::component("x", Noop)
                    .with_file(FileBlock::new("inter.woff2", BlockSource::Bytes(vec![0]))),
            )
            .expect("register");

        assert_eq!(
            font_preloads(&[&css], &registry, &options),
            vec![
                "<link rel=\"preload\" href=\"/_files/inter.woff2\" as=\"font\" type=\"font/woff2\" crossorigin>"
            ]
        );
    }

    #[test]
    fn preloads_follow_live_references_only() {
        let mut registry = TemplateRegistry::new();
        let options = RenderOptions::default();
        let css = CssBlock::inline(
            "icons",
            "@font-face{src:URL(icons.eot)} /* @font-face{src:url(retired.woff)} */",
        );
        registry
            .register(
                crate::application::registry::TemplateDescriptor::component("x", Noop)
                    .with_file(FileBlock::new("icons.eot", BlockSource::Bytes(vec![0])))
                    .with_file(FileBlock::new("retired.woff", BlockSource::Bytes(vec![0]))),
            )
            .expect("register");

        assert_eq!(
            font_preloads(&[&css], &registry, &options),
            vec![
                "<link rel=\"preload\" href=\"/_files/icons.eot\" as=\"font\" type=\"application/vnd.ms-fontobject\" crossorigin>"
            ]
        );
    }

    struct Noop;

    impl crate::application::template::Template for Noop {
        fn render(
            &self,
            _scope: &crate::application::scope::RenderScope<'_>,
        ) -> Result<String, crate::application::template::TemplateError> {
            Ok(String::new())
        }
    }
}
