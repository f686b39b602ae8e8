//! CSS, JS and file blocks registered alongside templates.

use std::{collections::HashMap, path::PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    domain::version::BlockVersion,
    infra::{assets, error::InfraError},
};

const EOT_MIME: &str = "application/vnd.ms-fontobject";

static CSS_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("css comment pattern"));
static CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)url\(\s*['"]?([^'")]+)"#).expect("css url pattern")
});

/// Where a block's content comes from. File sources are read once, when the
/// owning template is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSource {
    Text(String),
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl BlockSource {
    fn into_text(self) -> Result<String, InfraError> {
        match self {
            BlockSource::Text(text) => Ok(text),
            BlockSource::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|err| InfraError::asset(format!("block is not valid UTF-8: {err}"))),
            BlockSource::File(path) => assets::read_text(&path),
        }
    }

    fn into_bytes(self) -> Result<Vec<u8>, InfraError> {
        match self {
            BlockSource::Text(text) => Ok(text.into_bytes()),
            BlockSource::Bytes(bytes) => Ok(bytes),
            BlockSource::File(path) => assets::read_bytes(&path),
        }
    }
}

pub trait Block {
    fn name(&self) -> &str;

    fn version(&self) -> Option<BlockVersion>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssBlock {
    pub name: String,
    pub source: BlockSource,
    pub version: Option<BlockVersion>,
    /// Loaded without blocking render (print-media swap).
    pub is_async: bool,
    /// Only needed by the editor; kept out of normal page styles.
    pub targets_edit_bar: bool,
}

impl CssBlock {
    pub fn new(name: impl Into<String>, source: BlockSource) -> Self {
        Self {
            name: name.into(),
            source,
            version: None,
            is_async: false,
            targets_edit_bar: false,
        }
    }

    pub fn inline(name: impl Into<String>, css: impl Into<String>) -> Self {
        Self::new(name, BlockSource::Text(css.into()))
    }

    pub fn with_version(mut self, version: BlockVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn for_edit_bar(mut self) -> Self {
        self.targets_edit_bar = true;
        self
    }

    pub fn content(&self) -> &str {
        match &self.source {
            BlockSource::Text(text) => text,
            _ => "",
        }
    }

    /// File names referenced through `url(...)` in the stylesheet, ignoring
    /// comments and `data:` URIs.
    pub fn referenced_files(&self) -> Vec<String> {
        let css = CSS_COMMENT.replace_all(self.content(), "");
        let mut files = Vec::new();
        for captures in CSS_URL.captures_iter(&css) {
            let target = captures[1].trim();
            if target.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
                continue;
            }
            let without_suffix = target.split(['?', '#']).next().unwrap_or_default();
            let file = without_suffix
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            if !file.is_empty() && !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// Font files among [`CssBlock::referenced_files`].
    pub fn referenced_fonts(&self) -> Vec<String> {
        self.referenced_files()
            .into_iter()
            .filter(|file| font_mime(file).is_some())
            .collect()
    }

    fn load(self) -> Result<Self, InfraError> {
        let text = self.source.into_text()?;
        Ok(Self {
            source: BlockSource::Text(text),
            ..self
        })
    }
}

impl Block for CssBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<BlockVersion> {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsBlock {
    pub name: String,
    pub source: BlockSource,
    pub version: Option<BlockVersion>,
    pub is_async: bool,
    pub module: bool,
    pub nomodule: bool,
}

impl JsBlock {
    pub fn new(name: impl Into<String>, source: BlockSource) -> Self {
        Self {
            name: name.into(),
            source,
            version: None,
            is_async: false,
            module: false,
            nomodule: false,
        }
    }

    pub fn inline(name: impl Into<String>, js: impl Into<String>) -> Self {
        Self::new(name, BlockSource::Text(js.into()))
    }

    pub fn with_version(mut self, version: BlockVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn module(mut self) -> Self {
        self.module = true;
        self
    }

    pub fn nomodule(mut self) -> Self {
        self.nomodule = true;
        self
    }

    pub fn content(&self) -> &str {
        match &self.source {
            BlockSource::Text(text) => text,
            _ => "",
        }
    }

    fn load(self) -> Result<Self, InfraError> {
        let text = self.source.into_text()?;
        Ok(Self {
            source: BlockSource::Text(text),
            ..self
        })
    }
}

impl Block for JsBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<BlockVersion> {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub name: String,
    pub source: BlockSource,
    pub version: Option<BlockVersion>,
}

impl FileBlock {
    pub fn new(name: impl Into<String>, source: BlockSource) -> Self {
        Self {
            name: name.into(),
            source,
            version: None,
        }
    }

    pub fn with_version(mut self, version: BlockVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.source {
            BlockSource::Bytes(bytes) => bytes,
            BlockSource::Text(text) => text.as_bytes(),
            BlockSource::File(_) => &[],
        }
    }

    fn load(self) -> Result<Self, InfraError> {
        let bytes = self.source.into_bytes()?;
        Ok(Self {
            source: BlockSource::Bytes(bytes),
            ..self
        })
    }
}

impl Block for FileBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<BlockVersion> {
        self.version
    }
}

/// Blocks declared by one template, with file sources read into memory.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadedBlocks {
    pub(crate) css: Vec<CssBlock>,
    pub(crate) js: Vec<JsBlock>,
    pub(crate) files: Vec<FileBlock>,
}

impl LoadedBlocks {
    pub(crate) fn load(
        css: &[CssBlock],
        js: &[JsBlock],
        files: &[FileBlock],
    ) -> Result<Self, InfraError> {
        Ok(Self {
            css: css
                .iter()
                .cloned()
                .map(CssBlock::load)
                .collect::<Result<_, _>>()?,
            js: js
                .iter()
                .cloned()
                .map(JsBlock::load)
                .collect::<Result<_, _>>()?,
            files: files
                .iter()
                .cloned()
                .map(FileBlock::load)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockInsert {
    Inserted,
    Replaced {
        previous: BlockVersion,
        current: BlockVersion,
    },
    Kept,
}

/// Name-keyed block table applying the version rules: a block is replaced
/// only by a strictly greater version; ties and unversioned blocks keep the
/// first registration.
#[derive(Debug)]
pub struct BlockStore<T> {
    kind: &'static str,
    entries: HashMap<String, T>,
}

impl<T: Block> BlockStore<T> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, block: T) -> BlockInsert {
        let Some(existing) = self.entries.get(block.name()) else {
            self.entries.insert(block.name().to_string(), block);
            return BlockInsert::Inserted;
        };

        let (Some(previous), Some(current)) = (existing.version(), block.version()) else {
            debug!(kind = self.kind, block = block.name(), "keeping first unversioned block");
            return BlockInsert::Kept;
        };

        if previous.major != current.major {
            warn!(
                kind = self.kind,
                block = block.name(),
                %previous,
                %current,
                "major version mismatch between block registrations"
            );
        }

        if current > previous {
            self.entries.insert(block.name().to_string(), block);
            BlockInsert::Replaced { previous, current }
        } else {
            BlockInsert::Kept
        }
    }
}

/// MIME type for a font file name, `None` for anything that is not a font.
pub fn font_mime(file: &str) -> Option<String> {
    let mime = mime_guess::from_path(file).first()?;
    (mime.type_() == mime_guess::mime::FONT || mime.essence_str() == EOT_MIME)
        .then(|| mime.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versioned(name: &str, content: &str, version: &str) -> CssBlock {
        CssBlock::inline(name, content).with_version(version.parse().expect("version"))
    }

    #[test]
    fn greater_version_replaces() {
        let mut store = BlockStore::new("css");
        store.insert(versioned("shared", "a{}", "1.0.0"));
        let outcome = store.insert(versioned("shared", "b{}", "1.1.0"));

        assert!(matches!(outcome, BlockInsert::Replaced { .. }));
        assert_eq!(store.get("shared").map(CssBlock::content), Some("b{}"));
    }

    #[test]
    fn equal_or_lower_version_keeps_first() {
        let mut store = BlockStore::new("css");
        store.insert(versioned("shared", "a{}", "2.0.0"));

        assert_eq!(store.insert(versioned("shared", "b{}", "2.0.0")), BlockInsert::Kept);
        assert_eq!(store.insert(versioned("shared", "c{}", "1.9.9")), BlockInsert::Kept);
        assert_eq!(store.get("shared").map(CssBlock::content), Some("a{}"));
    }

    #[test]
    fn missing_versions_keep_first() {
        let mut store = BlockStore::new("css");
        store.insert(CssBlock::inline("shared", "a{}"));
        assert_eq!(store.insert(versioned("shared", "b{}", "9.0.0")), BlockInsert::Kept);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn major_mismatch_still_follows_version_order() {
        let mut store = BlockStore::new("css");
        store.insert(versioned("grid", "a{}", "1.4.0"));
        let outcome = store.insert(versioned("grid", "b{}", "2.0.0"));
        assert!(matches!(outcome, BlockInsert::Replaced { .. }));
    }

    #[test]
    fn finds_referenced_fonts() {
        let css = CssBlock::inline(
            "type",
            "@font-face{src:url('/files/inter.woff2?v=3') format('woff2'), url(inter.woff)}\
             .hero{background:url(\"hero.png\")}\
             .icon{background:url(data:image/png;base64,AAA)}",
        );

        assert_eq!(
            css.referenced_files(),
            vec!["inter.woff2", "inter.woff", "hero.png"]
        );
        assert_eq!(css.referenced_fonts(), vec!["inter.woff2", "inter.woff"]);
    }

    #[test]
    fn url_scan_is_case_insensitive_and_skips_comments() {
        let css = CssBlock::inline(
            "type",
            "@font-face{src:URL( \"inter.woff2\" )} /* url(old.woff)\n url(older.ttf) */\
             .bg{background:Url(DATA:image/png;base64,AAA)}",
        );

        assert_eq!(css.referenced_files(), vec!["inter.woff2"]);
        assert_eq!(css.referenced_fonts(), vec!["inter.woff2"]);
    }

    #[test]
    fn font_mime_covers_known_extensions() {
        assert_eq!(font_mime("a.WOFF2").as_deref(), Some("font/woff2"));
        assert_eq!(font_mime("a.otf").as_deref(), Some("font/otf"));
        assert_eq!(font_mime("icons.eot").as_deref(), Some(EOT_MIME));
        assert_eq!(font_mime("a.png"), None);
        assert_eq!(font_mime("noext"), None);
    }
}
