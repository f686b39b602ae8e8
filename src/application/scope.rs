//! Views handed to template capabilities, one per phase.
//!
//! Every scope dereferences to the node's [`NodeRef`], so templates read
//! their data, path and tree neighbours the same way in every phase.

use std::ops::Deref;

use serde_json::Value;

use crate::domain::{components::ComponentData, types::InheritMode};

use super::{
    api::{ContentApi, RequestContext},
    editbar::{EditBarOptions, NewBarOptions},
    inherit::{InheritRegistrar, InheritRegistration},
    session::{RenderOptions, RenderSession},
    template::{RenderContext, RenderedAreas, TemplateError},
    tree::{NodeRef, PageInfo},
};

static NO_DATA: Value = Value::Null;

pub struct FetchScope<'a> {
    node: NodeRef<'a>,
    session: &'a RenderSession,
    registrar: &'a InheritRegistrar,
}

impl<'a> FetchScope<'a> {
    pub(crate) fn new(
        node: NodeRef<'a>,
        session: &'a RenderSession,
        registrar: &'a InheritRegistrar,
    ) -> Self {
        Self {
            node,
            session,
            registrar,
        }
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn api(&self) -> &'a dyn ContentApi {
        self.session.api()
    }

    pub fn request(&self) -> &'a RequestContext {
        self.session.request()
    }

    /// Ask for `components` from page `from_page_id` to be spliced into this
    /// node's `area`. Returns `false` when the request was discarded, which
    /// is always the case for inherited nodes.
    pub fn register_inherited(
        &self,
        area: impl Into<String>,
        components: Vec<ComponentData>,
        mode: InheritMode,
        from_page_id: impl Into<String>,
    ) -> bool {
        self.registrar.register(InheritRegistration {
            area: area.into(),
            components,
            mode,
            from_page_id: from_page_id.into(),
        })
    }

    pub fn pass_error(&self, error: &TemplateError) {
        self.session.pass_error(self.node.path(), error);
    }
}

impl<'a> Deref for FetchScope<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

pub struct ContextScope<'a> {
    node: NodeRef<'a>,
    session: &'a RenderSession,
}

impl<'a> ContextScope<'a> {
    pub(crate) fn new(node: NodeRef<'a>, session: &'a RenderSession) -> Self {
        Self { node, session }
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn request(&self) -> &'a RequestContext {
        self.session.request()
    }

    /// Data returned by this node's `fetch`, `null` when nothing was fetched.
    pub fn fetched(&self) -> &'a Value {
        self.node.fetched().unwrap_or(&NO_DATA)
    }
}

impl<'a> Deref for ContextScope<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

pub struct RenderScope<'a> {
    node: NodeRef<'a>,
    session: &'a RenderSession,
    areas: &'a RenderedAreas,
}

impl<'a> RenderScope<'a> {
    pub(crate) fn new(
        node: NodeRef<'a>,
        session: &'a RenderSession,
        areas: &'a RenderedAreas,
    ) -> Self {
        Self {
            node,
            session,
            areas,
        }
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn rendered_areas(&self) -> &'a RenderedAreas {
        self.areas
    }

    /// Concatenated output of an area's children.
    pub fn area_output(&self, area: &str) -> String {
        self.areas.output(area)
    }

    pub fn fetched(&self) -> &'a Value {
        self.node.fetched().unwrap_or(&NO_DATA)
    }

    /// Context set by the parent; absent for variations and for nodes the
    /// context phase never reached.
    pub fn ctx(&self) -> Option<&'a RenderContext> {
        self.node.context()
    }

    pub fn heading_level(&self) -> u8 {
        self.ctx().map_or(1, |ctx| ctx.heading_level)
    }

    pub fn page(&self) -> &'a PageInfo {
        self.node.tree().page()
    }

    pub fn request(&self) -> &'a RequestContext {
        self.session.request()
    }

    pub fn options(&self) -> &'a RenderOptions {
        self.session.options()
    }

    fn editable(&self) -> bool {
        self.node.mode().is_edit() && !self.node.is_inherited()
    }

    /// Edit affordance for this node; empty outside edit mode and for
    /// inherited content.
    pub fn edit_bar(&self, options: &EditBarOptions) -> String {
        if !self.editable() {
            return String::new();
        }
        self.session
            .edit_bars
            .edit_bar(self.node.path(), self.node.label(), options)
    }

    /// Insertion affordance at the end of `area`.
    pub fn new_bar(&self, area: &str, options: &NewBarOptions) -> String {
        if !self.editable() {
            return String::new();
        }
        let path = if self.node.path().is_empty() {
            format!("areas.{area}")
        } else {
            format!("{}.areas.{area}", self.node.path())
        };
        self.session.edit_bars.new_bar(&path, options)
    }

    /// `None` removes the header.
    pub fn add_header(&self, name: &str, value: Option<&str>) {
        self.session.request.hooks.add_header(name, value);
    }

    pub fn set_status(&self, status: u16) {
        self.session.request.hooks.set_status(status);
    }

    pub fn pass_error(&self, error: &TemplateError) {
        self.session.pass_error(self.node.path(), error);
    }
}

impl<'a> Deref for RenderScope<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}
