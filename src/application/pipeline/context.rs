//! Context phase: top-down broadcast of `RenderContext` through the areas.

use std::time::Instant;

use futures::{
    FutureExt,
    future::{BoxFuture, join_all},
};
use tracing::debug;

use crate::domain::types::RenderPhase;

use super::super::{
    scope::ContextScope,
    session::RenderSession,
    template::{RenderContext, TemplateError},
    tree::{ComponentTree, NodeId},
};

enum ContextOutcome {
    Received(NodeId, RenderContext),
    Failed(NodeId, TemplateError),
}

pub(crate) async fn run(tree: &mut ComponentTree, session: &RenderSession) {
    let started_at = Instant::now();
    let initial = RenderContext::new(session.request().headers.clone());
    let outcomes = propagate(tree, session, tree.root(), initial).await;

    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            ContextOutcome::Received(id, ctx) => {
                tree.update_state(id, |state| state.into_context_set(ctx));
            }
            ContextOutcome::Failed(id, err) => {
                failed += 1;
                let path = tree.get(id).path().to_string();
                session.log_error(&path, RenderPhase::Context, &err);
                tree.update_state(id, |state| {
                    state.into_failed(RenderPhase::Context, err.to_string())
                });
            }
        }
    }

    debug!(
        target = "application::pipeline::context",
        failed,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "context phase complete"
    );
}

/// Hand `ctx` to `id`, then derive one context per area and recurse. Each
/// area gets its own copy; failed nodes are not descended into.
fn propagate<'a>(
    tree: &'a ComponentTree,
    session: &'a RenderSession,
    id: NodeId,
    ctx: RenderContext,
) -> BoxFuture<'a, Vec<ContextOutcome>> {
    async move {
        let node = tree.get(id);
        if node.has_error() {
            return Vec::new();
        }

        let branches = node.area_names().map(|area| {
            let parent_ctx = ctx.clone();
            async move {
                let derived = node
                    .template()
                    .set_context(ContextScope::new(node, session), parent_ctx, area)
                    .await;
                match derived {
                    Ok(child_ctx) => join_all(
                        node.child_ids(area)
                            .iter()
                            .map(|&child| propagate(tree, session, child, child_ctx.clone())),
                    )
                    .await
                    .into_iter()
                    .flatten()
                    .collect(),
                    Err(err) => vec![ContextOutcome::Failed(id, err)],
                }
            }
        });
        let branches: Vec<_> = branches.collect();

        let mut outcomes = vec![ContextOutcome::Received(id, ctx)];
        for branch in join_all(branches).await {
            outcomes.extend(branch);
        }
        outcomes
    }
    .boxed()
}
