//! Hydrated component tree.
//!
//! Nodes live in an arena owned by [`ComponentTree`] and refer to each other
//! by [`NodeId`]. Parents own ordered, named areas of children; the reverse
//! link is a plain id, so the tree stays free of reference cycles.

use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::domain::{
    components::ComponentData,
    types::{HTML_EXTENSION, RenderMode, RenderPhase},
};

use super::{
    registry::TemplateDescriptor,
    template::{RenderContext, Template},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    pub phase: RenderPhase,
    pub message: String,
}

/// Per-node progress through a single render. `Failed` is absorbing: every
/// transition out of it returns it unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeState {
    #[default]
    Pending,
    Fetched {
        fetched: Value,
    },
    ContextSet {
        fetched: Value,
        ctx: RenderContext,
    },
    Rendered {
        fetched: Value,
        ctx: Option<RenderContext>,
        output: String,
    },
    Failed(NodeFailure),
}

impl NodeState {
    pub fn is_failed(&self) -> bool {
        matches!(self, NodeState::Failed(_))
    }

    pub fn failure(&self) -> Option<&NodeFailure> {
        match self {
            NodeState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn fetched(&self) -> Option<&Value> {
        match self {
            NodeState::Fetched { fetched }
            | NodeState::ContextSet { fetched, .. }
            | NodeState::Rendered { fetched, .. } => Some(fetched),
            NodeState::Pending | NodeState::Failed(_) => None,
        }
    }

    pub fn context(&self) -> Option<&RenderContext> {
        match self {
            NodeState::ContextSet { ctx, .. } => Some(ctx),
            NodeState::Rendered { ctx, .. } => ctx.as_ref(),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            NodeState::Rendered { output, .. } => Some(output),
            _ => None,
        }
    }

    pub(crate) fn into_fetched(self, fetched: Value) -> Self {
        match self {
            NodeState::Failed(failure) => NodeState::Failed(failure),
            _ => NodeState::Fetched { fetched },
        }
    }

    pub(crate) fn into_context_set(self, ctx: RenderContext) -> Self {
        match self {
            NodeState::Pending => NodeState::ContextSet {
                fetched: Value::Null,
                ctx,
            },
            NodeState::Fetched { fetched } | NodeState::ContextSet { fetched, .. } => {
                NodeState::ContextSet { fetched, ctx }
            }
            other => other,
        }
    }

    pub(crate) fn into_rendered(self, output: String) -> Self {
        match self {
            NodeState::Pending => NodeState::Rendered {
                fetched: Value::Null,
                ctx: None,
                output,
            },
            NodeState::Fetched { fetched } => NodeState::Rendered {
                fetched,
                ctx: None,
                output,
            },
            NodeState::ContextSet { fetched, ctx } => NodeState::Rendered {
                fetched,
                ctx: Some(ctx),
                output,
            },
            NodeState::Rendered { fetched, ctx, .. } => NodeState::Rendered {
                fetched,
                ctx,
                output,
            },
            NodeState::Failed(failure) => NodeState::Failed(failure),
        }
    }

    /// The first failure wins; later ones are ignored.
    pub(crate) fn into_failed(self, phase: RenderPhase, message: String) -> Self {
        match self {
            NodeState::Failed(failure) => NodeState::Failed(failure),
            _ => NodeState::Failed(NodeFailure { phase, message }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Area {
    pub(crate) name: String,
    pub(crate) children: Vec<NodeId>,
}

/// A hydrated node.
#[derive(Debug)]
pub struct ComponentNode {
    pub(crate) id: NodeId,
    /// Key and fields only; nested areas live in the tree.
    pub(crate) data: Arc<ComponentData>,
    pub(crate) descriptor: Arc<TemplateDescriptor>,
    pub(crate) label: String,
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) area: Option<String>,
    pub(crate) index_in_area: usize,
    pub(crate) areas: Vec<Area>,
    pub(crate) inherited_from: Option<String>,
    pub(crate) recursive_inherit: bool,
    pub(crate) state: NodeState,
}

impl ComponentNode {
    pub(crate) fn new(
        data: Arc<ComponentData>,
        descriptor: Arc<TemplateDescriptor>,
        label: String,
        path: String,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            id: NodeId::new(0),
            data,
            descriptor,
            label,
            path,
            parent,
            area: None,
            index_in_area: 0,
            areas: Vec::new(),
            inherited_from: None,
            recursive_inherit: false,
            state: NodeState::Pending,
        }
    }
}

/// Request-level attributes owned by the page root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageInfo {
    pub id: String,
    pub url: Option<String>,
    pub template_properties: Value,
    pub head_content: String,
}

#[derive(Debug)]
pub struct ComponentTree {
    nodes: Vec<ComponentNode>,
    mode: RenderMode,
    extension: String,
    page: PageInfo,
}

impl ComponentTree {
    /// Start a tree with `root` as the page node.
    pub(crate) fn new(
        root: ComponentNode,
        mode: RenderMode,
        extension: impl Into<String>,
        page: PageInfo,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            mode,
            extension: extension.into(),
            page,
        };
        tree.push(root);
        tree
    }

    pub(crate) fn push(&mut self, mut node: ComponentNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        self.get(self.root())
    }

    pub(crate) fn node(&self, id: NodeId) -> &ComponentNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ComponentNode {
        &mut self.nodes[id.0]
    }

    /// Number of nodes ever hydrated, including ones detached by a replace splice.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_variation(&self) -> bool {
        self.extension != HTML_EXTENSION
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    pub(crate) fn page_mut(&mut self) -> &mut PageInfo {
        &mut self.page
    }

    pub fn root_failed(&self) -> bool {
        self.node(self.root()).state.is_failed()
    }

    /// `start` and every node reachable below it, parents before children,
    /// areas and children in order.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            ordered.push(id);
            for area in self.node(id).areas.iter().rev() {
                stack.extend(area.children.iter().rev().copied());
            }
        }
        ordered
    }

    pub(crate) fn take_area(&mut self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.node_mut(id)
            .areas
            .iter_mut()
            .find(|area| area.name == name)
            .map(|area| std::mem::take(&mut area.children))
            .unwrap_or_default()
    }

    /// Replace an area's children and renumber their positional metadata.
    pub(crate) fn set_area(&mut self, id: NodeId, name: &str, children: Vec<NodeId>) {
        for (index, &child) in children.iter().enumerate() {
            let node = self.node_mut(child);
            node.parent = Some(id);
            node.area = Some(name.to_string());
            node.index_in_area = index;
        }

        let areas = &mut self.node_mut(id).areas;
        match areas.iter_mut().find(|area| area.name == name) {
            Some(area) => area.children = children,
            None => areas.push(Area {
                name: name.to_string(),
                children,
            }),
        }
    }

    pub(crate) fn update_state(&mut self, id: NodeId, update: impl FnOnce(NodeState) -> NodeState) {
        let node = self.node_mut(id);
        let state = std::mem::take(&mut node.state);
        node.state = update(state);
    }
}

/// Borrowed view of one node with tree-aware navigation.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ComponentTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a ComponentNode {
        self.tree.node(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a ComponentTree {
        self.tree
    }

    pub fn template_key(&self) -> &'a str {
        self.node().descriptor.key()
    }

    pub fn descriptor(&self) -> &'a TemplateDescriptor {
        &self.node().descriptor
    }

    pub fn template(&self) -> &'a Arc<dyn Template> {
        self.node().descriptor.template()
    }

    pub fn data(&self) -> &'a ComponentData {
        &self.node().data
    }

    pub fn field(&self, name: &str) -> Option<&'a Value> {
        self.node().data.field(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&'a str> {
        self.node().data.str_field(name)
    }

    /// Label from templates metadata, falling back to the template key.
    pub fn label(&self) -> &'a str {
        &self.node().label
    }

    pub fn path(&self) -> &'a str {
        &self.node().path
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.tree.get(id))
    }

    pub fn area_name(&self) -> Option<&'a str> {
        self.node().area.as_deref()
    }

    pub fn index_in_area(&self) -> usize {
        self.node().index_in_area
    }

    pub fn area_names(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.node().areas.iter().map(|area| area.name.as_str())
    }

    pub fn child_ids(&self, area: &str) -> &'a [NodeId] {
        self.node()
            .areas
            .iter()
            .find(|candidate| candidate.name == area)
            .map(|candidate| candidate.children.as_slice())
            .unwrap_or_default()
    }

    pub fn children(&self, area: &str) -> Vec<NodeRef<'a>> {
        self.child_ids(area)
            .iter()
            .map(|&id| self.tree.get(id))
            .collect()
    }

    /// Every node in the same area, this one included, in render order.
    pub fn siblings(&self) -> Vec<NodeRef<'a>> {
        match (self.parent(), self.area_name()) {
            (Some(parent), Some(area)) => parent.children(area),
            _ => vec![*self],
        }
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'a>> {
        let index = self.index_in_area().checked_sub(1)?;
        self.sibling_at(index)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.sibling_at(self.index_in_area() + 1)
    }

    fn sibling_at(&self, index: usize) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        let area = self.area_name()?;
        parent
            .child_ids(area)
            .get(index)
            .map(|&id| self.tree.get(id))
    }

    pub fn inherited_from(&self) -> Option<&'a str> {
        self.node().inherited_from.as_deref()
    }

    /// True for spliced-in nodes and everything below them.
    pub fn is_inherited(&self) -> bool {
        self.node().inherited_from.is_some() || self.node().recursive_inherit
    }

    pub fn state(&self) -> &'a NodeState {
        &self.node().state
    }

    pub fn has_error(&self) -> bool {
        self.node().state.is_failed()
    }

    pub fn fetched(&self) -> Option<&'a Value> {
        self.node().state.fetched()
    }

    pub fn context(&self) -> Option<&'a RenderContext> {
        self.node().state.context()
    }

    pub fn mode(&self) -> RenderMode {
        self.tree.mode
    }

    pub fn extension(&self) -> &'a str {
        &self.tree.extension
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("template_key", &self.template_key())
            .field("path", &self.path())
            .finish()
    }
}

/// Dotted address of a child: `areas.<area>.<segment>` below `parent`.
pub(crate) fn child_path(parent: &str, area: &str, segment: &str) -> String {
    if parent.is_empty() {
        format!("areas.{area}.{segment}")
    } else {
        format!("{parent}.areas.{area}.{segment}")
    }
}
