//! Shell drilling-rotation fixation.
//!
//! Shell elements carry no stiffness for the rotation about their normal.
//! For shells lying in one global coordinate plane that rotation is fixed
//! to zero on every shell node: DOF 4, 5 or 6 for a plane normal to X, Y or
//! Z. Shells in general orientation are rejected.

use std::collections::BTreeSet;

use nalgebra::Vector3;
use ofx_deck::{BoundaryConditionRecord, ElementRole, SetRecord};
use ofx_model::Dimension;
use tracing::debug;

use crate::context::SynthesisContext;
use crate::error::{Result, SynthesisError};

const AXES: [char; 3] = ['X', 'Y', 'Z'];

/// Index of the single global axis along which all points share one
/// coordinate
pub fn shared_axis(points: &[Vector3<f64>], tolerance: f64) -> Result<usize> {
    let Some(first) = points.first() else {
        return Err(SynthesisError::AmbiguousInput(
            "no shell nodes to derive a plane from".to_string(),
        ));
    };
    let (low, high) = points
        .iter()
        .fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
    let spread = high - low;

    let candidates: Vec<usize> = (0..3).filter(|&i| spread[i] <= tolerance).collect();
    match candidates.as_slice() {
        [axis] => Ok(*axis),
        [] => Err(SynthesisError::AmbiguousInput(format!(
            "shell nodes share no global coordinate (spread {:?})",
            [spread.x, spread.y, spread.z]
        ))),
        many => Err(SynthesisError::AmbiguousInput(format!(
            "shell nodes share coordinates along {} axes",
            many.len()
        ))),
    }
}

pub fn fix_drilling_rotations(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    // planar surface elements are membranes without rotations
    if ctx.dimension() == Dimension::Planar {
        return Ok(());
    }
    let shell_nodes: BTreeSet<u32> = ctx
        .registry
        .elements()
        .filter(|e| e.kind.is_surface() && e.role == ElementRole::Structural)
        .flat_map(|e| e.nodes.iter().copied())
        .collect();
    if shell_nodes.is_empty() {
        return Ok(());
    }

    let points = shell_nodes
        .iter()
        .map(|id| {
            ctx.registry
                .node(*id)
                .map(|n| Vector3::from(n.coords))
                .ok_or_else(|| SynthesisError::not_found(format!("node {id}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let axis = shared_axis(&points, ctx.config.coordinate_tolerance)?;
    let dof = axis + 4;

    let set = ctx.registry.add_set(SetRecord {
        nodes: shell_nodes.iter().copied().collect(),
        ..SetRecord::new()
    })?;
    let time_function = ctx.default_time_function();
    ctx.registry
        .add_boundary_condition(BoundaryConditionRecord::new(
            ctx.config.rotation_fixation.clone(),
            format!("dofs 1 {dof} values 1 0"),
            time_function,
            set,
        ))?;
    ctx.report.rotation_axis = Some(AXES[axis]);
    debug!(axis = %AXES[axis], dof, nodes = shell_nodes.len(), "fixed drilling rotations");
    Ok(())
}
