//! Line element splitting for loads applied to part of an element.
//!
//! Splitting element `E = (A, B)` at relative positions `p1 < p2 < …`
//! inserts one node per position at `A + (B - A) * p`, shortens `E` to end
//! at the first inserted node and chains new elements from there to `B`.
//! Every set holding `E` (whole, or by edge/surface rank 1) is extended with
//! each new element the same way, so the pieces stay in every group the
//! original belonged to.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use ofx_deck::{ElementRecord, NodeRecord, RecordRegistry};
use ofx_model::{ElementKind, Scope};
use tracing::debug;

use crate::context::SynthesisContext;
use crate::error::{Result, SynthesisError};

/// Relative positions closer than this are the same cut
pub const POSITION_EPSILON: f64 = 1e-9;

/// One sub-element and the relative interval of the original it covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPiece {
    pub element: u32,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// Sub-elements from the first node on; the first keeps the original id
    pub pieces: Vec<SplitPiece>,
    /// Inserted nodes with their relative positions
    pub nodes: Vec<(f64, u32)>,
    pub first_node: u32,
    pub last_node: u32,
}

impl SplitOutcome {
    /// End node or inserted node at a relative position
    pub fn node_at(&self, position: f64) -> Option<u32> {
        if position <= POSITION_EPSILON {
            return Some(self.first_node);
        }
        if position >= 1.0 - POSITION_EPSILON {
            return Some(self.last_node);
        }
        self.nodes
            .iter()
            .find(|(p, _)| (p - position).abs() <= POSITION_EPSILON)
            .map(|(_, node)| *node)
    }

    /// Pieces lying inside `[start, end]`
    pub fn pieces_within(&self, start: f64, end: f64) -> impl Iterator<Item = &SplitPiece> {
        self.pieces.iter().filter(move |piece| {
            piece.start >= start - POSITION_EPSILON && piece.end <= end + POSITION_EPSILON
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ElementRefinementEngine;

impl ElementRefinementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Split a two-node line element at relative positions.
    ///
    /// Positions at or beyond either end are ignored; duplicates collapse.
    pub fn split_line_element(
        &self,
        registry: &mut RecordRegistry,
        element: u32,
        positions: &[f64],
    ) -> Result<SplitOutcome> {
        let record = registry
            .element(element)
            .cloned()
            .ok_or_else(|| SynthesisError::not_found(format!("element {element}")))?;
        if record.kind != ElementKind::Line {
            return Err(SynthesisError::unsupported(format!(
                "splitting {} element {element}",
                record.kind
            )));
        }
        let &[first_node, last_node] = record.nodes.as_slice() else {
            return Err(SynthesisError::InvariantViolation(format!(
                "line element {element} has {} nodes",
                record.nodes.len()
            )));
        };

        let mut cuts: Vec<f64> = positions
            .iter()
            .copied()
            .filter(|p| *p > POSITION_EPSILON && *p < 1.0 - POSITION_EPSILON)
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() <= POSITION_EPSILON);

        let mut outcome = SplitOutcome {
            pieces: Vec::with_capacity(cuts.len() + 1),
            nodes: Vec::with_capacity(cuts.len()),
            first_node,
            last_node,
        };
        let Some(&first_cut) = cuts.first() else {
            outcome.pieces.push(SplitPiece {
                element,
                start: 0.0,
                end: 1.0,
            });
            return Ok(outcome);
        };

        let a = position_of(registry, first_node)?;
        let b = position_of(registry, last_node)?;
        let holding = registry.sets_holding_element(element);

        for &p in &cuts {
            let at = a + (b - a) * p;
            let node = registry.add_node(NodeRecord::plain([at.x, at.y, at.z]))?;
            outcome.nodes.push((p, node));
        }

        registry.replace_node_in_element(element, last_node, outcome.nodes[0].1)?;
        outcome.pieces.push(SplitPiece {
            element,
            start: 0.0,
            end: first_cut,
        });

        for (i, &(start, from)) in outcome.nodes.iter().enumerate() {
            let (end, to) = outcome.nodes.get(i + 1).copied().unwrap_or((1.0, last_node));
            let piece = registry.add_element(
                ElementRecord::new(ElementKind::Line, record.type_name.clone(), vec![from, to])
                    .with_params(record.params.clone())
                    .with_role(record.role),
            )?;
            for (set, memberships) in &holding {
                for membership in memberships {
                    registry.extend_set(*set, piece, *membership)?;
                }
            }
            outcome.pieces.push(SplitPiece {
                element: piece,
                start,
                end,
            });
        }

        debug!(
            element,
            cuts = cuts.len(),
            sets = holding.len(),
            "split line element"
        );
        Ok(outcome)
    }
}

fn position_of(registry: &RecordRegistry, node: u32) -> Result<Vector3<f64>> {
    registry
        .node(node)
        .map(|n| Vector3::from(n.coords))
        .ok_or_else(|| SynthesisError::not_found(format!("node {node}")))
}

/// Split every element carrying partial applications and hand each
/// application's set the pieces inside its range.
///
/// All applications on one element are split together, so a range
/// `[0.3, 0.7]` yields three pieces and its set receives only the middle
/// one. A point application (`start == end`) on a node-scoped set receives
/// the node at that position.
pub fn refine_partial_applications(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let engine = ElementRefinementEngine::new();

    let mut by_element: BTreeMap<u32, Vec<(u32, Scope, f64, f64)>> = BTreeMap::new();
    for pending in &ctx.pending_splits {
        for span in &pending.spans {
            by_element.entry(span.element).or_default().push((
                pending.set,
                pending.scope,
                span.start,
                span.end,
            ));
        }
    }

    for (element, applications) in by_element {
        let positions: Vec<f64> = applications
            .iter()
            .flat_map(|&(_, _, start, end)| [start, end])
            .collect();
        let outcome = engine.split_line_element(&mut ctx.registry, element, &positions)?;
        if outcome.pieces.len() > 1 {
            ctx.report.split_elements += 1;
            ctx.report.inserted_nodes += outcome.nodes.len();
        }
        for (set, scope, start, end) in applications {
            assign_span(&mut ctx.registry, &outcome, set, scope, start, end)?;
        }
    }
    Ok(())
}

fn assign_span(
    registry: &mut RecordRegistry,
    outcome: &SplitOutcome,
    set: u32,
    scope: Scope,
    start: f64,
    end: f64,
) -> Result<()> {
    if end - start <= POSITION_EPSILON {
        if scope != Scope::Nodes {
            return Err(SynthesisError::unsupported(format!(
                "point application with {scope} scope on element {}",
                outcome.pieces[0].element
            )));
        }
        let node = outcome.node_at(start).ok_or_else(|| {
            SynthesisError::InvariantViolation(format!("no node at relative position {start}"))
        })?;
        registry.extend_set_with_node(set, node)?;
        return Ok(());
    }

    for piece in outcome.pieces_within(start, end) {
        match scope {
            Scope::Nodes => {
                let nodes = registry
                    .element(piece.element)
                    .map(|e| e.nodes.clone())
                    .unwrap_or_default();
                for node in nodes {
                    registry.extend_set_with_node(set, node)?;
                }
            }
            Scope::Elements => registry.extend_set_with_element(set, piece.element)?,
            Scope::Edges => registry.extend_set_with_edge(set, piece.element, 1)?,
            Scope::Surfaces => registry.extend_set_with_surface(set, piece.element, 1)?,
        }
    }
    Ok(())
}
