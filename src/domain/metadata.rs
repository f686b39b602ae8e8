//! Template metadata published by the content API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata keyed by template key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplatesMetadata {
    entries: BTreeMap<String, TemplateMetadata>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub areas: Vec<AreaMetadata>,
    #[serde(default)]
    pub template_properties: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaMetadata {
    pub name: String,
}

impl TemplatesMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, metadata: TemplateMetadata) {
        self.entries.insert(key.into(), metadata);
    }

    pub fn with_template(mut self, key: impl Into<String>, metadata: TemplateMetadata) -> Self {
        self.insert(key, metadata);
        self
    }

    pub fn get(&self, key: &str) -> Option<&TemplateMetadata> {
        self.entries.get(key)
    }

    /// Human-readable label for a template, falling back to its key.
    pub fn label_for(&self, key: &str) -> String {
        self.entries
            .get(key)
            .and_then(|meta| meta.name.clone())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TemplateMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas
            .into_iter()
            .map(|name| AreaMetadata { name: name.into() })
            .collect();
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.template_properties = properties;
        self
    }

    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|area| area.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_api_shape() {
        let raw = json!({
            "section": {
                "name": "Section",
                "areas": [{ "name": "content" }],
                "templateProperties": { "color": "blue" }
            },
            "rich-text": {}
        });

        let metadata: TemplatesMetadata = serde_json::from_value(raw).expect("metadata");
        let section = metadata.get("section").expect("section entry");

        assert_eq!(section.area_names().collect::<Vec<_>>(), vec!["content"]);
        assert_eq!(section.template_properties["color"], "blue");
        assert_eq!(metadata.label_for("section"), "Section");
        assert_eq!(metadata.label_for("rich-text"), "rich-text");
        assert_eq!(metadata.label_for("unknown"), "unknown");
    }
}
