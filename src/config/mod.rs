//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::types::{HTML_EXTENSION, RenderMode};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mosaic";
const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_EDITOR_SCRIPT: &str = "/_editor/editor.js";
const DEFAULT_EDITOR_STYLESHEET: &str = "/_editor/editor.css";
const DEFAULT_CSS_PREFIX: &str = "/_css";
const DEFAULT_JS_PREFIX: &str = "/_js";
const DEFAULT_FILES_PREFIX: &str = "/_files";
const MAX_FETCH_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Command-line arguments for the Mosaic binary.
#[derive(Debug, Parser)]
#[command(name = "mosaic", version, about = "Mosaic component page renderer")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MOSAIC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render one page from the content directory to stdout or a file.
    Render(RenderArgs),
    /// List the registered templates and their declared blocks.
    Templates(TemplatesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: SharedOverrides,

    /// Identifier of the page to render (`pages/<id>.json`).
    #[arg(value_name = "PAGE_ID")]
    pub page_id: String,

    /// Output extension; anything other than `html` renders a variation.
    #[arg(long, default_value = HTML_EXTENSION)]
    pub extension: String,

    /// Render mode (live|preview|edit).
    #[arg(long, default_value = "live")]
    pub mode: RenderMode,

    /// Request URL handed to templates.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Write the body here instead of stdout.
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct TemplatesArgs {
    #[command(flatten)]
    pub overrides: SharedOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SharedOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content directory.
    #[arg(long = "content-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub content_dir: Option<PathBuf>,

    /// Override the per-component fetch timeout; 0 disables it.
    #[arg(long = "render-fetch-timeout-ms", value_name = "MILLIS")]
    pub fetch_timeout_ms: Option<u64>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub content: ContentSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub editor_script: String,
    pub editor_stylesheet: String,
    pub css_prefix: String,
    pub js_prefix: String,
    pub files_prefix: String,
    pub fetch_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("MOSAIC").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Render(args)) => raw.apply_overrides(&args.overrides),
        Some(Command::Templates(args)) => raw.apply_overrides(&args.overrides),
        None => raw.apply_overrides(&SharedOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    content: RawContentSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    editor_script: Option<String>,
    editor_stylesheet: Option<String>,
    css_prefix: Option<String>,
    js_prefix: Option<String>,
    files_prefix: Option<String>,
    fetch_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    directory: Option<PathBuf>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SharedOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.content_dir.as_ref() {
            self.content.directory = Some(directory.clone());
        }
        if let Some(timeout) = overrides.fetch_timeout_ms {
            self.render.fetch_timeout_ms = Some(timeout);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            render,
            content,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render)?,
            content: build_content_settings(content)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let fetch_timeout = match render.fetch_timeout_ms {
        None | Some(0) => None,
        Some(millis) if millis > MAX_FETCH_TIMEOUT_MS => {
            return Err(LoadError::invalid(
                "render.fetch_timeout_ms",
                format!("must not exceed {MAX_FETCH_TIMEOUT_MS}"),
            ));
        }
        Some(millis) => Some(Duration::from_millis(millis)),
    };

    Ok(RenderSettings {
        editor_script: non_empty_or(
            render.editor_script,
            DEFAULT_EDITOR_SCRIPT,
            "render.editor_script",
        )?,
        editor_stylesheet: non_empty_or(
            render.editor_stylesheet,
            DEFAULT_EDITOR_STYLESHEET,
            "render.editor_stylesheet",
        )?,
        css_prefix: non_empty_or(render.css_prefix, DEFAULT_CSS_PREFIX, "render.css_prefix")?,
        js_prefix: non_empty_or(render.js_prefix, DEFAULT_JS_PREFIX, "render.js_prefix")?,
        files_prefix: non_empty_or(
            render.files_prefix,
            DEFAULT_FILES_PREFIX,
            "render.files_prefix",
        )?,
        fetch_timeout,
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let directory = content
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid("content.directory", "must not be empty"));
    }
    Ok(ContentSettings { directory })
}

fn non_empty_or(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(LoadError::invalid(key, "must not be empty"))
            } else {
                Ok(trimmed.to_string())
            }
        }
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
        assert_eq!(settings.render.css_prefix, DEFAULT_CSS_PREFIX);
        assert!(settings.render.fetch_timeout.is_none());
        assert_eq!(settings.content.directory, PathBuf::from(DEFAULT_CONTENT_DIR));
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.logging.level = Some("info".to_string());
        raw.content.directory = Some(PathBuf::from("/srv/content"));

        let overrides = SharedOverrides {
            log_level: Some("debug".to_string()),
            content_dir: Some(PathBuf::from("/tmp/content")),
            fetch_timeout_ms: Some(250),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.content.directory, PathBuf::from("/tmp/content"));
        assert_eq!(
            settings.render.fetch_timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn zero_timeout_disables_it() {
        let mut raw = RawSettings::default();
        raw.render.fetch_timeout_ms = Some(0);
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.render.fetch_timeout.is_none());
    }

    #[test]
    fn oversized_timeout_is_rejected() {
        let mut raw = RawSettings::default();
        raw.render.fetch_timeout_ms = Some(MAX_FETCH_TIMEOUT_MS + 1);
        let err = Settings::from_raw(raw).expect_err("too large");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "render.fetch_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let mut raw = RawSettings::default();
        raw.render.css_prefix = Some("  ".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut raw = RawSettings::default();
        raw.logging.level = Some("loud".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = SharedOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn parse_render_arguments() {
        let args = CliArgs::parse_from([
            "mosaic",
            "render",
            "blog",
            "--extension",
            "rss",
            "--mode",
            "preview",
            "--content-dir",
            "/tmp/content",
        ]);

        match args.command.expect("render command") {
            Command::Render(render) => {
                assert_eq!(render.page_id, "blog");
                assert_eq!(render.extension, "rss");
                assert_eq!(render.mode, RenderMode::Preview);
                assert_eq!(
                    render.overrides.content_dir.as_deref(),
                    Some(std::path::Path::new("/tmp/content"))
                );
                assert!(render.output.is_none());
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn render_defaults_to_live_html() {
        let args = CliArgs::parse_from(["mosaic", "render", "home"]);
        match args.command.expect("render command") {
            Command::Render(render) => {
                assert_eq!(render.extension, HTML_EXTENSION);
                assert_eq!(render.mode, RenderMode::Live);
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_templates_command() {
        let args = CliArgs::parse_from(["mosaic", "templates", "--log-json", "true"]);
        match args.command.expect("templates command") {
            Command::Templates(templates) => {
                assert_eq!(templates.overrides.log_json, Some(true));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
