//! Content API backed by a directory of JSON files.
//!
//! Layout:
//!
//! ```text
//! <root>/templates.json     templates metadata keyed by template key
//! <root>/navigation.json    navigation trees keyed by root name
//! <root>/pages/<id>.json    one page record per file
//! ```

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    application::api::{ApiError, ContentApi, NavigationItem},
    domain::{components::PageRecord, metadata::TemplatesMetadata},
};

use super::assets::is_safe_name;

const TEMPLATES_FILE: &str = "templates.json";
const NAVIGATION_FILE: &str = "navigation.json";
const PAGES_DIR: &str = "pages";
const PAGE_LINK_PREFIX: &str = "page:";

#[derive(Debug, Clone)]
pub struct FsContentApi {
    root: PathBuf,
}

impl FsContentApi {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn page_path(&self, id: &str) -> Result<PathBuf, ApiError> {
        if !is_safe_name(id) {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(self.root.join(PAGES_DIR).join(format!("{id}.json")))
    }

    /// Read and parse a JSON file; a missing file yields `None`.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, ApiError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "content file missing");
                return Ok(None);
            }
            Err(err) => {
                return Err(ApiError::upstream(format!(
                    "failed to read `{}`: {err}",
                    path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| ApiError::malformed(format!("`{}`: {err}", path.display())))
    }
}

#[async_trait]
impl ContentApi for FsContentApi {
    async fn fetch_templates_metadata(&self) -> Result<TemplatesMetadata, ApiError> {
        Ok(self
            .read_json(&self.root.join(TEMPLATES_FILE))
            .await?
            .unwrap_or_default())
    }

    async fn fetch_page(&self, id: &str) -> Result<Option<PageRecord>, ApiError> {
        let path = self.page_path(id)?;
        let Some(mut raw) = self.read_json::<Value>(&path).await? else {
            return Ok(None);
        };

        // The file name is the page id unless the record says otherwise.
        if let Value::Object(fields) = &mut raw {
            fields
                .entry("id")
                .or_insert_with(|| Value::String(id.to_string()));
        }

        serde_json::from_value(raw)
            .map(Some)
            .map_err(|err| ApiError::malformed(format!("`{}`: {err}", path.display())))
    }

    async fn get_navigation(
        &self,
        root: &str,
        depth: usize,
    ) -> Result<Vec<NavigationItem>, ApiError> {
        let trees: BTreeMap<String, Vec<NavigationItem>> = self
            .read_json(&self.root.join(NAVIGATION_FILE))
            .await?
            .unwrap_or_default();

        let items = trees
            .get(root)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("navigation `{root}`")))?;
        Ok(truncate_depth(items, depth))
    }

    async fn resolve_link(&self, link: &str) -> Result<Option<String>, ApiError> {
        if let Some(id) = link.strip_prefix(PAGE_LINK_PREFIX) {
            let page = match self.fetch_page(id).await {
                Ok(page) => page,
                Err(ApiError::NotFound(_)) => None,
                Err(err) => return Err(err),
            };
            return Ok(page.map(|page| page.url.unwrap_or_else(|| format!("/{}", page.id))));
        }

        if link.starts_with('/') || link.starts_with("http://") || link.starts_with("https://") {
            return Ok(Some(link.to_string()));
        }

        Ok(None)
    }
}

/// Keep `depth` levels of the tree; `0` keeps only the top level.
fn truncate_depth(items: Vec<NavigationItem>, depth: usize) -> Vec<NavigationItem> {
    items
        .into_iter()
        .map(|mut item| {
            item.children = match depth.checked_sub(1) {
                Some(remaining) => truncate_depth(item.children, remaining),
                None => Vec::new(),
            };
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, children: Vec<NavigationItem>) -> NavigationItem {
        NavigationItem {
            title: title.to_string(),
            href: format!("/{title}"),
            children,
        }
    }

    #[test]
    fn truncates_navigation_depth() {
        let tree = vec![item("a", vec![item("b", vec![item("c", Vec::new())])])];

        let flat = truncate_depth(tree.clone(), 0);
        assert!(flat[0].children.is_empty());

        let one = truncate_depth(tree, 1);
        assert_eq!(one[0].children.len(), 1);
        assert!(one[0].children[0].children.is_empty());
    }

    #[tokio::test]
    async fn missing_files_are_empty_not_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = FsContentApi::new(dir.path());

        assert!(api.fetch_templates_metadata().await.expect("metadata").is_empty());
        assert!(api.fetch_page("home").await.expect("page").is_none());
    }

    #[tokio::test]
    async fn rejects_traversal_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = FsContentApi::new(dir.path());
        assert!(matches!(
            api.fetch_page("../secret").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
