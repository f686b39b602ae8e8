//! Rendering core: registry, tree model, hydration and the render pipeline.

pub mod api;
pub mod editbar;
pub mod error;
pub mod head;
pub mod hydrate;
pub mod inherit;
pub mod pipeline;
pub mod registry;
pub mod scope;
pub mod session;
pub mod template;
pub mod tree;
