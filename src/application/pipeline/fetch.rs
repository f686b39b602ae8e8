//! Fetch phase: every node's `fetch` concurrently, then inherited splicing
//! and one more round for the spliced nodes.

use std::{collections::HashMap, time::Instant};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{metadata::TemplatesMetadata, types::RenderPhase};

use super::super::{
    hydrate::{Inheritance, declared_areas, hydrate_component},
    inherit::{InheritRegistrar, InheritRegistration, apply_splice},
    registry::TemplateRegistry,
    scope::FetchScope,
    session::RenderSession,
    template::TemplateError,
    tree::{ComponentTree, NodeId, child_path},
};

struct FetchOutcome {
    id: NodeId,
    result: Result<Value, TemplateError>,
    registrations: Vec<InheritRegistration>,
}

/// Run the phase and return the master node list: the original tree in
/// pre-order followed by every spliced subtree.
pub(crate) async fn run(
    tree: &mut ComponentTree,
    registry: &TemplateRegistry,
    metadata: &TemplatesMetadata,
    session: &RenderSession,
) -> Vec<NodeId> {
    let started_at = Instant::now();
    let mut master = tree.preorder(tree.root());

    let outcomes = fetch_round(tree, session, &master, true).await;
    let registrations = apply_outcomes(tree, session, outcomes);

    let spliced_roots = splice_all(tree, registry, metadata, registrations);
    let spliced: Vec<NodeId> = spliced_roots
        .iter()
        .flat_map(|&root| tree.preorder(root))
        .collect();

    if !spliced.is_empty() {
        let outcomes = fetch_round(tree, session, &spliced, false).await;
        apply_outcomes(tree, session, outcomes);
        master.extend(spliced.iter().copied());
    }

    debug!(
        target = "application::pipeline::fetch",
        nodes = master.len(),
        inherited = spliced.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "fetch phase complete"
    );
    master
}

async fn fetch_round(
    tree: &ComponentTree,
    session: &RenderSession,
    nodes: &[NodeId],
    allow_inherit: bool,
) -> Vec<FetchOutcome> {
    join_all(
        nodes
            .iter()
            .map(|&id| fetch_node(tree, session, id, allow_inherit)),
    )
    .await
}

async fn fetch_node(
    tree: &ComponentTree,
    session: &RenderSession,
    id: NodeId,
    allow_inherit: bool,
) -> FetchOutcome {
    let node = tree.get(id);
    let template = node.template();

    if tree.is_variation() && !template.should_fetch_variation(tree.extension()) {
        return FetchOutcome {
            id,
            result: Ok(Value::Null),
            registrations: Vec::new(),
        };
    }

    let registrar = if allow_inherit && !node.is_inherited() {
        InheritRegistrar::enabled()
    } else {
        InheritRegistrar::disabled()
    };

    let result = {
        let fetch = template.fetch(FetchScope::new(node, session, &registrar));
        match session.options().fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or_else(|_| Err(TemplateError::Timeout(limit))),
            None => fetch.await,
        }
    };

    FetchOutcome {
        id,
        result,
        registrations: registrar.into_entries(),
    }
}

/// Record fetched data or failures; returns the registrations of nodes
/// whose fetch succeeded, in node order.
fn apply_outcomes(
    tree: &mut ComponentTree,
    session: &RenderSession,
    outcomes: Vec<FetchOutcome>,
) -> Vec<(NodeId, InheritRegistration)> {
    let mut registrations = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(fetched) => {
                tree.update_state(outcome.id, |state| state.into_fetched(fetched));
                registrations.extend(
                    outcome
                        .registrations
                        .into_iter()
                        .map(|registration| (outcome.id, registration)),
                );
            }
            Err(err) => {
                let path = tree.get(outcome.id).path().to_string();
                session.log_error(&path, RenderPhase::Fetch, &err);
                tree.update_state(outcome.id, |state| {
                    state.into_failed(RenderPhase::Fetch, err.to_string())
                });
            }
        }
    }
    registrations
}

#[derive(Default)]
struct AreaSplice {
    cursor: usize,
    inherited: usize,
}

/// Splice every registration into its node's area and return the roots of
/// the hydrated inherited subtrees, in splice order.
fn splice_all(
    tree: &mut ComponentTree,
    registry: &TemplateRegistry,
    metadata: &TemplatesMetadata,
    registrations: Vec<(NodeId, InheritRegistration)>,
) -> Vec<NodeId> {
    let mut areas: HashMap<(NodeId, String), AreaSplice> = HashMap::new();
    let mut spliced = Vec::new();

    for (id, registration) in registrations {
        let node = tree.get(id);
        let declared = declared_areas(node.descriptor(), metadata);
        if !declared.iter().any(|area| *area == registration.area) {
            warn!(
                template = node.template_key(),
                path = node.path(),
                area = %registration.area,
                "ignoring inherited components for undeclared area"
            );
            continue;
        }

        let parent_path = node.path().to_string();
        let state = areas
            .entry((id, registration.area.clone()))
            .or_default();
        let inheritance = Inheritance::from_page(registration.from_page_id.as_str());

        let mut incoming = Vec::with_capacity(registration.components.len());
        for data in &registration.components {
            let path = child_path(
                &parent_path,
                &registration.area,
                &format!("inherited.{}", state.inherited),
            );
            state.inherited += 1;
            if let Some(child) =
                hydrate_component(tree, registry, metadata, data, Some(id), path, &inheritance)
            {
                incoming.push(child);
            }
        }

        let existing = tree.take_area(id, &registration.area);
        let (children, cursor) =
            apply_splice(existing, incoming.clone(), registration.mode, state.cursor);
        state.cursor = cursor;
        tree.set_area(id, &registration.area, children);

        debug!(
            path = %parent_path,
            area = %registration.area,
            from = %registration.from_page_id,
            mode = ?registration.mode,
            components = incoming.len(),
            "spliced inherited components"
        );
        spliced.extend(incoming);
    }

    spliced
}
