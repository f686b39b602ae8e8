//! Render phase: synchronous, bottom-up. Children are rendered first and
//! handed to their parent as `RenderedAreas`.

use std::time::Instant;

use tracing::debug;

use crate::{domain::types::RenderPhase, util::html::escape_attribute};

use super::super::{
    scope::RenderScope,
    session::RenderSession,
    template::{RenderedArea, RenderedAreas, RenderedChild, TemplateError},
    tree::{ComponentTree, NodeId, NodeRef},
};

pub const ERROR_PLACEHOLDER: &str = "There was an error rendering a component here.";

enum RenderUpdate {
    Rendered(String),
    Failed(String),
}

/// Render the whole tree and record each node's output in its state.
/// Variation extensions call `render_variation` instead of `render`.
pub(crate) fn run(tree: &mut ComponentTree, session: &RenderSession) -> String {
    let started_at = Instant::now();
    let mut updates = Vec::new();
    let output = render_node(tree, session, tree.root(), &mut updates);

    let mut failed = 0usize;
    for (id, update) in updates {
        match update {
            RenderUpdate::Rendered(output) => {
                tree.update_state(id, |state| state.into_rendered(output));
            }
            RenderUpdate::Failed(message) => {
                failed += 1;
                tree.update_state(id, |state| state.into_failed(RenderPhase::Render, message));
            }
        }
    }

    debug!(
        target = "application::pipeline::render",
        extension = tree.extension(),
        failed,
        bytes = output.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "render phase complete"
    );
    output
}

fn render_node(
    tree: &ComponentTree,
    session: &RenderSession,
    id: NodeId,
    updates: &mut Vec<(NodeId, RenderUpdate)>,
) -> String {
    let node = tree.get(id);
    if node.has_error() {
        return failure_output(node);
    }

    let mut areas = RenderedAreas::default();
    for area in node.area_names() {
        let children = node
            .child_ids(area)
            .iter()
            .map(|&child| RenderedChild {
                output: render_node(tree, session, child, updates),
                component: child,
            })
            .collect();
        areas.push(RenderedArea {
            name: area.to_string(),
            children,
        });
    }

    let scope = RenderScope::new(node, session, &areas);
    let template = node.template();
    let result: Result<String, TemplateError> = if tree.is_variation() {
        template.render_variation(&scope, tree.extension())
    } else {
        template.render(&scope)
    };

    match result {
        Ok(output) => {
            updates.push((id, RenderUpdate::Rendered(output.clone())));
            output
        }
        Err(err) => {
            session.log_error(node.path(), RenderPhase::Render, &err);
            updates.push((id, RenderUpdate::Failed(err.to_string())));
            failure_output(node)
        }
    }
}

/// Failed nodes vanish for readers; editors of HTML pages get a placeholder.
fn failure_output(node: NodeRef<'_>) -> String {
    if node.mode().is_edit() && !node.tree().is_variation() {
        format!(
            "<div class=\"mosaic-component-error\" data-path=\"{}\">{ERROR_PLACEHOLDER}</div>",
            escape_attribute(node.path())
        )
    } else {
        String::new()
    }
}
