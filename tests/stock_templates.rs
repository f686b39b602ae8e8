use std::{fs, path::Path, sync::Arc};

use serde_json::json;
use tempfile::TempDir;

use mosaic::application::{
    api::{ContentApi, RecordedResponse, RequestContext},
    pipeline::Renderer,
    registry::TemplateRegistry,
};
use mosaic::domain::types::RenderMode;
use mosaic::infra::fs_api::FsContentApi;
use mosaic::templates::{RSS_EXTENSION, register_stock};

fn write_json(path: &Path, value: serde_json::Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, serde_json::to_vec_pretty(&value).expect("json")).expect("write");
}

fn content_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();

    write_json(
        &root.join("navigation.json"),
        json!({
            "main": [
                { "title": "Home", "href": "/", "children": [] },
                { "title": "Blog", "href": "/blog", "children": [] }
            ]
        }),
    );
    write_json(
        &root.join("pages/home.json"),
        json!({
            "templateKey": "standard-page",
            "url": "/",
            "title": "Home",
            "areas": {
                "header": [{ "templateKey": "navigation" }],
                "main": [{ "templateKey": "rich-text", "text": "Welcome home" }]
            }
        }),
    );
    write_json(
        &root.join("pages/blog.json"),
        json!({
            "templateKey": "standard-page",
            "url": "/blog",
            "title": "Blog",
            "description": "Notes & news",
            "parentPage": "home",
            "areas": {
                "main": [{
                    "templateKey": "section",
                    "title": "Latest",
                    "areas": {
                        "content": [
                            {
                                "templateKey": "feed-item",
                                "title": "Hello",
                                "link": "page:home",
                                "summary": "First post"
                            },
                            { "templateKey": "retired-widget" }
                        ]
                    }
                }]
            }
        }),
    );
    dir
}

fn renderer() -> Renderer {
    let mut registry = TemplateRegistry::new();
    register_stock(&mut registry).expect("stock templates");
    Renderer::new(registry.into_shared())
}

async fn render(
    dir: &TempDir,
    page_id: &str,
    extension: &str,
    mode: RenderMode,
) -> (String, Arc<RecordedResponse>) {
    let api = Arc::new(FsContentApi::new(dir.path()));
    let page = api
        .fetch_page(page_id)
        .await
        .expect("read page")
        .expect("page exists");
    let response = Arc::new(RecordedResponse::new());
    let url = page.url.clone().unwrap_or_default();
    let request = RequestContext::new(url).with_hooks(response.clone());

    let body = renderer()
        .render_page(api, request, &page, extension, mode)
        .await
        .expect("render");
    (body, response)
}

#[tokio::test]
async fn standard_page_inherits_the_parent_header() {
    let dir = content_dir();

    let (body, response) = render(&dir, "blog", "html", RenderMode::Live).await;

    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("<title>Blog</title>"));
    assert!(body.contains("<link rel=\"canonical\" href=\"/blog\">"));
    assert!(body.contains("<a href=\"/blog\" aria-current=\"page\">Blog</a>"));
    assert!(body.contains("<h1>Latest</h1>"));
    assert!(body.contains("<h2><a href=\"/\">Hello</a></h2>"));
    assert!(body.contains("/_css/page.css"));
    assert!(body.contains("/_css/section.css"));
    assert!(!body.contains("retired-widget"));
    assert!(!body.contains("<edit-bar"));
    assert_eq!(response.snapshot().status, None);
    assert!(response.snapshot().headers.is_empty());
}

#[tokio::test]
async fn edit_mode_emits_bars_but_not_for_inherited_header() {
    let dir = content_dir();

    let (body, response) = render(&dir, "blog", "html", RenderMode::Edit).await;

    assert!(body.contains("/_editor/editor.js"));
    assert!(body.contains("window.mosaicEditBarCss = [\"page-editing\"];"));
    assert!(body.contains("<edit-bar data-path=\"\""));
    assert!(body.contains("<edit-bar data-path=\"areas.main.0\""));
    assert!(body.contains("<new-bar data-path=\"areas.main.0.areas.content\""));
    assert!(!body.contains("data-path=\"areas.header.inherited.0\""));
    assert_eq!(
        response.snapshot().headers.get("cache-control").map(String::as_str),
        Some("no-store")
    );
}

#[tokio::test]
async fn rss_variation_renders_feed_items_only() {
    let dir = content_dir();

    let (body, _) = render(&dir, "blog", RSS_EXTENSION, RenderMode::Live).await;

    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(body.contains("<title>Blog</title>"));
    assert!(body.contains("<link>/blog</link>"));
    assert!(body.contains("<description>Notes &amp; news</description>"));
    assert!(body.contains("<item>\n<title>Hello</title>\n<link>/</link>"));
    assert!(!body.contains("<section"));
    assert!(!body.contains("<nav"));
    assert!(!body.contains("<link rel="));
}

#[tokio::test]
async fn missing_parent_page_keeps_the_page_rendering() {
    let dir = content_dir();
    write_json(
        &dir.path().join("pages/orphan.json"),
        json!({
            "templateKey": "standard-page",
            "title": "Orphan",
            "parentPage": "gone",
            "areas": { "main": [{ "templateKey": "rich-text", "text": "Still here" }] }
        }),
    );

    let (body, response) = render(&dir, "orphan", "html", RenderMode::Live).await;

    assert!(body.contains("<p>Still here</p>"));
    assert!(!body.contains("<nav"));
    assert_eq!(response.snapshot().status, None);
}

#[tokio::test]
async fn unsupported_variation_fails_the_root() {
    let dir = content_dir();

    let (body, response) = render(&dir, "home", "atom", RenderMode::Live).await;

    assert_eq!(body, "");
    assert_eq!(response.snapshot().status, Some(500));
}
