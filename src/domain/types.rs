//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Extension rendered as a full HTML document. Anything else is a variation.
pub const HTML_EXTENSION: &str = "html";

/// How a page is being rendered for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Anonymous visitors, published content.
    #[default]
    Live,
    /// Tokened preview of a specific version.
    Preview,
    /// Interactive editing with edit-bar affordances.
    Edit,
}

impl RenderMode {
    pub fn is_edit(self) -> bool {
        matches!(self, RenderMode::Edit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Live => "live",
            RenderMode::Preview => "preview",
            RenderMode::Edit => "edit",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(RenderMode::Live),
            "preview" => Ok(RenderMode::Preview),
            "edit" => Ok(RenderMode::Edit),
            other => Err(DomainError::validation(format!(
                "unknown render mode `{other}`"
            ))),
        }
    }
}

/// Whether a template registers as the root of a page or as a nested component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Page,
    Component,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Page => "page",
            TemplateKind::Component => "component",
        }
    }
}

/// Placement of inherited components relative to an area's own children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritMode {
    Top,
    Bottom,
    Replace,
}

impl FromStr for InheritMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(InheritMode::Top),
            "bottom" => Ok(InheritMode::Bottom),
            "replace" => Ok(InheritMode::Replace),
            other => Err(DomainError::validation(format!(
                "unknown inheritance mode `{other}`"
            ))),
        }
    }
}

/// Render phase a node was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Fetch,
    Context,
    Render,
}

impl RenderPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderPhase::Fetch => "fetch",
            RenderPhase::Context => "context",
            RenderPhase::Render => "render",
        }
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mode_parses_case_insensitively() {
        assert_eq!("EDIT".parse::<RenderMode>().unwrap(), RenderMode::Edit);
        assert_eq!(" preview ".parse::<RenderMode>().unwrap(), RenderMode::Preview);
        assert!("draft".parse::<RenderMode>().is_err());
    }

    #[test]
    fn inherit_mode_round_trips_through_serde() {
        let mode: InheritMode = serde_json::from_str("\"replace\"").expect("mode");
        assert_eq!(mode, InheritMode::Replace);
        assert_eq!(serde_json::to_string(&InheritMode::Top).unwrap(), "\"top\"");
    }
}
