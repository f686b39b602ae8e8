//! Template registry: template key to descriptor, plus the CSS, JS and file
//! block tables those templates declare.
//!
//! Populated once at startup and shared read-only behind an `Arc` afterwards.

mod blocks;
mod descriptor;

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::infra::error::InfraError;

pub use blocks::{
    Block, BlockInsert, BlockSource, BlockStore, CssBlock, FileBlock, JsBlock, font_mime,
};
pub use descriptor::TemplateDescriptor;

use blocks::LoadedBlocks;

static INSTALLED: OnceCell<Arc<TemplateRegistry>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("template registered without a key")]
    MissingTemplateKey,
    #[error("template `{key}` could not load its blocks: {source}")]
    Asset {
        key: String,
        #[source]
        source: InfraError,
    },
    #[error("a template registry is already installed")]
    AlreadyInstalled,
}

impl RegistryError {
    /// Configuration errors that must stop startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RegistryError::Asset { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Added,
    AlreadyPresent,
}

#[derive(Debug)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<TemplateDescriptor>>,
    order: Vec<Arc<TemplateDescriptor>>,
    css: BlockStore<CssBlock>,
    js: BlockStore<JsBlock>,
    files: BlockStore<FileBlock>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
            order: Vec::new(),
            css: BlockStore::new("css"),
            js: BlockStore::new("js"),
            files: BlockStore::new("file"),
        }
    }

    /// Record a template and the blocks it declares. The first registration
    /// of a key wins; later ones are ignored.
    pub fn register(&mut self, descriptor: TemplateDescriptor) -> Result<Registered, RegistryError> {
        if descriptor.key().trim().is_empty() {
            return Err(RegistryError::MissingTemplateKey);
        }

        if self.templates.contains_key(descriptor.key()) {
            debug!(key = descriptor.key(), "template already registered");
            return Ok(Registered::AlreadyPresent);
        }

        let loaded = LoadedBlocks::load(descriptor.css(), descriptor.js(), descriptor.files())
            .map_err(|source| RegistryError::Asset {
                key: descriptor.key().to_string(),
                source,
            })?;

        for block in loaded.css {
            self.css.insert(block);
        }
        for block in loaded.js {
            self.js.insert(block);
        }
        for block in loaded.files {
            self.files.insert(block);
        }

        debug!(
            key = descriptor.key(),
            kind = descriptor.kind().as_str(),
            "registered template"
        );
        let descriptor = Arc::new(descriptor);
        self.templates
            .insert(descriptor.key().to_string(), Arc::clone(&descriptor));
        self.order.push(descriptor);
        Ok(Registered::Added)
    }

    /// Register every descriptor. Templates whose assets fail to load are
    /// skipped with an error log; a missing key aborts.
    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = TemplateDescriptor>,
    ) -> Result<usize, RegistryError> {
        let mut added = 0;
        for descriptor in descriptors {
            match self.register(descriptor) {
                Ok(Registered::Added) => added += 1,
                Ok(Registered::AlreadyPresent) => {}
                Err(err) if !err.is_fatal() => {
                    error!(error = %err, "skipping template");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(added)
    }

    pub fn template(&self, key: &str) -> Option<&Arc<TemplateDescriptor>> {
        self.templates.get(key)
    }

    pub fn page(&self, key: &str) -> Option<&Arc<TemplateDescriptor>> {
        self.template(key).filter(|descriptor| descriptor.is_page())
    }

    pub fn component(&self, key: &str) -> Option<&Arc<TemplateDescriptor>> {
        self.template(key).filter(|descriptor| !descriptor.is_page())
    }

    /// All templates in registration order.
    pub fn templates(&self) -> impl Iterator<Item = &TemplateDescriptor> {
        self.order.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn css_block(&self, name: &str) -> Option<&CssBlock> {
        self.css.get(name)
    }

    pub fn js_block(&self, name: &str) -> Option<&JsBlock> {
        self.js.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&FileBlock> {
        self.files.get(name)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Install the process-wide registry. Only the first call succeeds.
pub fn install(registry: TemplateRegistry) -> Result<Arc<TemplateRegistry>, RegistryError> {
    let shared = registry.into_shared();
    INSTALLED
        .set(Arc::clone(&shared))
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    info!(templates = shared.len(), "template registry installed");
    Ok(shared)
}

pub fn installed() -> Option<Arc<TemplateRegistry>> {
    INSTALLED.get().cloned()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::application::{
        scope::RenderScope,
        template::{Template, TemplateError},
    };

    struct Fixed(&'static str);

    impl Template for Fixed {
        fn render(&self, _scope: &RenderScope<'_>) -> Result<String, TemplateError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = TemplateRegistry::new();
        let first = registry
            .register(TemplateDescriptor::component("card", Fixed("a")).with_areas(["body"]))
            .expect("register");
        let second = registry
            .register(TemplateDescriptor::page("card", Fixed("b")))
            .expect("register");

        assert_eq!(first, Registered::Added);
        assert_eq!(second, Registered::AlreadyPresent);
        let card = registry.template("card").expect("card");
        assert!(!card.is_page());
        assert_eq!(card.areas(), ["body".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn typed_lookups_respect_kind() {
        let mut registry = TemplateRegistry::new();
        registry
            .register(TemplateDescriptor::page("home", Fixed("")))
            .expect("page");
        registry
            .register(TemplateDescriptor::component("card", Fixed("")))
            .expect("component");

        assert!(registry.page("home").is_some());
        assert!(registry.component("home").is_none());
        assert!(registry.component("card").is_some());
        assert!(registry.page("card").is_none());
        assert_eq!(
            registry.templates().map(TemplateDescriptor::key).collect::<Vec<_>>(),
            ["home", "card"]
        );
    }

    #[test]
    fn empty_key_is_fatal() {
        let mut registry = TemplateRegistry::new();
        let err = registry
            .register_all([TemplateDescriptor::component(" ", Fixed(""))])
            .expect_err("missing key");
        assert!(matches!(err, RegistryError::MissingTemplateKey));
    }

    #[test]
    fn unreadable_assets_skip_only_that_template() {
        let mut registry = TemplateRegistry::new();
        let added = registry
            .register_all([
                TemplateDescriptor::component("broken", Fixed("")).with_css(CssBlock::new(
                    "broken",
                    BlockSource::File(PathBuf::from("/no/such/file.css")),
                )),
                TemplateDescriptor::component("fine", Fixed(""))
                    .with_css(CssBlock::inline("fine", ".fine{}")),
            ])
            .expect("non-fatal");

        assert_eq!(added, 1);
        assert!(registry.template("broken").is_none());
        assert_eq!(registry.css_block("fine").map(CssBlock::content), Some(".fine{}"));
    }

    #[test]
    fn blocks_from_files_are_loaded_at_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("card.js");
        std::fs::write(&path, "console.log('card')").expect("write");

        let mut registry = TemplateRegistry::new();
        registry
            .register(
                TemplateDescriptor::component("card", Fixed(""))
                    .with_js(JsBlock::new("card", BlockSource::File(path)).module()),
            )
            .expect("register");

        let block = registry.js_block("card").expect("js block");
        assert_eq!(block.content(), "console.log('card')");
        assert!(block.module);
    }

    #[test]
    fn shared_blocks_follow_version_rules_across_templates() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_all([
                TemplateDescriptor::component("a", Fixed("")).with_css(
                    CssBlock::inline("grid", "v1").with_version("1.0.0".parse().expect("v")),
                ),
                TemplateDescriptor::component("b", Fixed("")).with_css(
                    CssBlock::inline("grid", "v2").with_version("1.2.0".parse().expect("v")),
                ),
                TemplateDescriptor::component("c", Fixed("")).with_css(
                    CssBlock::inline("grid", "v0").with_version("0.9.0".parse().expect("v")),
                ),
            ])
            .expect("register");

        assert_eq!(registry.css_block("grid").map(CssBlock::content), Some("v2"));
    }
}
