//! Raw component data as delivered by the content API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of a page as stored upstream: a template key, arbitrary
/// template-specific fields and optional named areas of nested components.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentData {
    #[serde(default)]
    pub template_key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub areas: BTreeMap<String, Vec<ComponentData>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ComponentData {
    pub fn new(template_key: impl Into<String>) -> Self {
        Self {
            template_key: template_key.into(),
            areas: BTreeMap::new(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_area(mut self, name: impl Into<String>, children: Vec<ComponentData>) -> Self {
        self.areas.insert(name.into(), children);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// The template key and fields alone; nested areas are left out.
    pub fn without_areas(&self) -> Self {
        Self {
            template_key: self.template_key.clone(),
            areas: BTreeMap::new(),
            fields: self.fields.clone(),
        }
    }

    /// Children stored under `name`, empty when the area is absent.
    pub fn area(&self, name: &str) -> &[ComponentData] {
        self.areas.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A resolved page: its identity plus the root component data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub content: ComponentData,
}

impl PageRecord {
    pub fn new(id: impl Into<String>, content: ComponentData) -> Self {
        Self {
            id: id.into(),
            url: None,
            content,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
