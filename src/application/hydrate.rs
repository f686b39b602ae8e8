//! Raw component data to a typed component tree.
//!
//! Hydration is a pure transform: no I/O, no template code runs. Unknown
//! component templates are dropped with their subtree; an unknown page
//! template is the only hard failure.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    components::{ComponentData, PageRecord},
    metadata::TemplatesMetadata,
    types::RenderMode,
};

use super::{
    registry::{TemplateDescriptor, TemplateRegistry},
    tree::{ComponentNode, ComponentTree, NodeId, PageInfo, child_path},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HydrateError {
    #[error("no page template registered for `{key}`")]
    UnknownPageTemplate { key: String },
    #[error("template `{key}` is a component and cannot render a page")]
    ComponentAsPage { key: String },
}

/// Inheritance markers carried down a hydrated subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Inheritance {
    pub(crate) from: Option<String>,
    pub(crate) recursive: bool,
}

impl Inheritance {
    pub(crate) fn from_page(id: impl Into<String>) -> Self {
        Self {
            from: Some(id.into()),
            recursive: false,
        }
    }

    /// Markers for the children of a node carrying `self`.
    fn descend(&self) -> Self {
        Self {
            from: self.from.clone(),
            recursive: self.from.is_some() || self.recursive,
        }
    }
}

pub fn hydrate(
    page: &PageRecord,
    registry: &TemplateRegistry,
    metadata: &TemplatesMetadata,
    mode: RenderMode,
    extension: &str,
) -> Result<ComponentTree, HydrateError> {
    let key = page.content.template_key.as_str();
    let descriptor = match registry.template(key) {
        Some(descriptor) if descriptor.is_page() => Arc::clone(descriptor),
        Some(_) => {
            return Err(HydrateError::ComponentAsPage {
                key: key.to_string(),
            });
        }
        None => {
            return Err(HydrateError::UnknownPageTemplate {
                key: key.to_string(),
            });
        }
    };

    let info = PageInfo {
        id: page.id.clone(),
        url: page.url.clone(),
        template_properties: metadata
            .get(key)
            .map(|entry| entry.template_properties.clone())
            .unwrap_or_default(),
        head_content: String::new(),
    };

    let data = &page.content;
    let root = ComponentNode::new(
        Arc::new(data.without_areas()),
        Arc::clone(&descriptor),
        metadata.label_for(key),
        String::new(),
        None,
    );
    let mut tree = ComponentTree::new(root, mode, extension, info);
    let root_id = tree.root();
    hydrate_areas(
        &mut tree,
        registry,
        metadata,
        root_id,
        data,
        &descriptor,
        &Inheritance::default(),
    );

    debug!(page = %page.id, nodes = tree.len(), "hydrated page");
    Ok(tree)
}

/// Hydrate one component and its declared areas into `tree`. Returns `None`
/// when the template is unknown, in which case nothing is added.
pub(crate) fn hydrate_component(
    tree: &mut ComponentTree,
    registry: &TemplateRegistry,
    metadata: &TemplatesMetadata,
    data: &ComponentData,
    parent: Option<NodeId>,
    path: String,
    inheritance: &Inheritance,
) -> Option<NodeId> {
    let key = data.template_key.as_str();
    let descriptor = match registry.template(key) {
        Some(descriptor) if !descriptor.is_page() => Arc::clone(descriptor),
        Some(_) => {
            warn!(template = key, path = %path, "dropping page template used as component");
            return None;
        }
        None => {
            warn!(template = key, path = %path, "dropping component with unknown template");
            return None;
        }
    };

    let mut node = ComponentNode::new(
        Arc::new(data.without_areas()),
        Arc::clone(&descriptor),
        metadata.label_for(key),
        path,
        parent,
    );
    node.inherited_from = inheritance.from.clone();
    node.recursive_inherit = inheritance.recursive;
    let id = tree.push(node);

    hydrate_areas(
        tree,
        registry,
        metadata,
        id,
        data,
        &descriptor,
        &inheritance.descend(),
    );
    Some(id)
}

fn hydrate_areas(
    tree: &mut ComponentTree,
    registry: &TemplateRegistry,
    metadata: &TemplatesMetadata,
    id: NodeId,
    data: &ComponentData,
    descriptor: &TemplateDescriptor,
    inheritance: &Inheritance,
) {
    let declared = declared_areas(descriptor, metadata);

    for name in data.areas.keys() {
        if !declared.iter().any(|area| area == name) {
            debug!(
                template = descriptor.key(),
                area = %name,
                "ignoring undeclared area"
            );
        }
    }

    let parent_path = tree.node(id).path.clone();
    for area in &declared {
        let children = data
            .area(area)
            .iter()
            .enumerate()
            .filter_map(|(index, child)| {
                hydrate_component(
                    tree,
                    registry,
                    metadata,
                    child,
                    Some(id),
                    child_path(&parent_path, area, &index.to_string()),
                    inheritance,
                )
            })
            .collect();
        tree.set_area(id, area, children);
    }
}

/// Areas hydrated for a template: those listed in its metadata entry, or
/// the descriptor's static list when metadata names none.
pub(crate) fn declared_areas(
    descriptor: &TemplateDescriptor,
    metadata: &TemplatesMetadata,
) -> Vec<String> {
    match metadata.get(descriptor.key()) {
        Some(entry) if !entry.areas.is_empty() => {
            entry.area_names().map(str::to_string).collect()
        }
        _ => descriptor.areas().to_vec(),
    }
}
