//! Hinges: a rigid-arm node co-located with the shared node takes over the
//! hinged beam's end, and each child spring joins the two.

use ofx_deck::{ElementRecord, ElementRole, NodeRecord};
use ofx_model::{Attribute, AttributeKind, ElementKind, MacroId, MacroKind, NodeId};
use tracing::{debug, warn};

use crate::context::SynthesisContext;
use crate::error::{Result, SynthesisError};
use crate::population::spring_type_name;
use crate::resolver::macro_kind;

pub fn release_hinges(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let model = ctx.model;
    for hinge in model.attributes_where(|k| matches!(k, AttributeKind::Hinge { .. })) {
        let AttributeKind::Hinge { beam, springs } = &hinge.kind else {
            continue;
        };
        if let Some(owner) = model.geometry.macro_by_id(*beam) {
            let kind = macro_kind(owner)?;
            if !matches!(kind, MacroKind::Beam | MacroKind::Column) {
                return Err(SynthesisError::unsupported(format!(
                    "hinge {} on {kind:?} macro {beam}",
                    hinge.id
                )));
            }
        }
        let springs = springs
            .iter()
            .map(|id| {
                model
                    .attribute(*id)
                    .filter(|a| matches!(a.kind, AttributeKind::Spring))
                    .ok_or_else(|| {
                        SynthesisError::not_found(format!("spring {id} of hinge {}", hinge.id))
                    })
            })
            .collect::<Result<Vec<&Attribute>>>()?;

        let nodes = ctx.resolver.resolve(hinge)?.nodes;
        if nodes.is_empty() {
            warn!(hinge = hinge.id, "hinge has no mesh node, skipped");
            continue;
        }

        for node in nodes {
            let element = hinged_element(ctx, *beam, node).ok_or_else(|| {
                SynthesisError::not_found(format!(
                    "line element of beam {beam} at node {node} for hinge {}",
                    hinge.id
                ))
            })?;
            let coords = ctx
                .registry
                .node(node)
                .map(|n| n.coords)
                .ok_or_else(|| SynthesisError::not_found(format!("node {node}")))?;

            let rigid = ctx.registry.add_node(NodeRecord::rigid_arm(
                coords,
                node,
                ctx.config.rigid_arm_params.clone(),
            ))?;
            ctx.registry.replace_node_in_element(element, node, rigid)?;

            for spring in &springs {
                let name = spring_type_name(ctx, spring).to_string();
                ctx.registry.add_element(
                    ElementRecord::new(ElementKind::Line, name, vec![node, rigid])
                        .with_params(spring.params.clone())
                        .with_role(ElementRole::Spring),
                )?;
                ctx.report.spring_elements += 1;
            }
            ctx.report.hinges += 1;
            debug!(hinge = hinge.id, node, rigid, element, "released hinge");
        }
    }
    Ok(())
}

/// Lowest-id line element of `beam` still connected to `node`
fn hinged_element(ctx: &SynthesisContext<'_>, beam: MacroId, node: NodeId) -> Option<u32> {
    let mut candidates: Vec<u32> = ctx
        .mesh
        .elements
        .iter()
        .filter(|e| e.kind == ElementKind::Line && e.owner == Some(beam))
        .map(|e| e.id)
        .collect();
    candidates.sort_unstable();
    candidates.into_iter().find(|id| {
        ctx.registry
            .element(*id)
            .is_some_and(|e| e.nodes.contains(&node))
    })
}
