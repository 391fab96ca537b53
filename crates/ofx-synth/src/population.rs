//! First pass: imports the mesh and turns declared attributes into records.
//!
//! Nodes and elements keep their mesh ids; every other record gets a fresh
//! id from the registry. Cross-sections and boundary conditions receive one
//! set each, built from their resolved targets.

use std::collections::BTreeMap;

use ofx_deck::{
    BoundaryConditionRecord, CrossSectionRecord, ElementRecord, ElementRole, MaterialRecord,
    NodeRecord, SectionRole, TimeFunctionRecord, TimeFunctionShape,
};
use ofx_model::{
    Attribute, AttributeKind, ElementId, MeshElement, MeshNode, TimeCurve, TimeFunction,
};
use tracing::debug;

use crate::context::{PendingSplit, SoilSection, SynthesisContext};
use crate::error::{Result, SynthesisError};
use crate::resolver::MeshEntitySet;

pub fn populate(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    import_nodes(ctx)?;
    let springs = spring_assignments(ctx)?;
    import_elements(ctx, &springs)?;
    add_time_functions(ctx)?;
    add_materials(ctx);
    add_cross_sections(ctx)?;
    add_boundary_conditions(ctx)?;
    debug!(
        springs = springs.len(),
        soil_sections = ctx.soil_sections.len(),
        pending_splits = ctx.pending_splits.len(),
        "population finished"
    );
    Ok(())
}

fn import_nodes(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let mut nodes: Vec<&MeshNode> = ctx.mesh.nodes.iter().collect();
    nodes.sort_by_key(|n| n.id);
    for node in nodes {
        ctx.registry
            .import_node(NodeRecord::plain(node.coords).with_id(node.id))?;
    }
    Ok(())
}

/// Mesh elements declared as springs, first attribute wins
fn spring_assignments<'a>(ctx: &SynthesisContext<'a>) -> Result<BTreeMap<ElementId, &'a Attribute>> {
    let mut springs = BTreeMap::new();
    let model = ctx.model;
    for attribute in model.attributes_where(|k| matches!(k, AttributeKind::Spring)) {
        // springs without targets are hinge children
        if attribute.targets.is_empty() {
            continue;
        }
        for element in ctx.resolver.resolve(attribute)?.elements {
            springs.entry(element).or_insert(attribute);
        }
    }
    Ok(springs)
}

fn import_elements<'a>(
    ctx: &mut SynthesisContext<'a>,
    springs: &BTreeMap<ElementId, &'a Attribute>,
) -> Result<()> {
    let mut elements: Vec<&MeshElement> = ctx.mesh.elements.iter().collect();
    elements.sort_by_key(|e| e.id);
    for element in elements {
        let record = match springs.get(&element.id) {
            Some(spring) => {
                ctx.report.spring_elements += 1;
                ElementRecord::new(
                    element.kind,
                    spring_type_name(ctx, spring),
                    element.nodes.clone(),
                )
                .with_params(spring.params.clone())
                .with_role(ElementRole::Spring)
            }
            None => ElementRecord::new(
                element.kind,
                ctx.element_type(element.kind),
                element.nodes.clone(),
            )
            .with_params(element.params.clone().unwrap_or_default()),
        };
        ctx.registry.import_element(record.with_id(element.id))?;
    }
    Ok(())
}

pub(crate) fn spring_type_name<'a>(ctx: &SynthesisContext<'a>, spring: &'a Attribute) -> &'a str {
    if spring.name.trim().is_empty() {
        &ctx.config.spring_element
    } else {
        &spring.name
    }
}

/// Curve of a model time function over the simulation's step times
pub fn time_function_shape(function: &TimeFunction, steps: &[f64]) -> Result<TimeFunctionShape> {
    match &function.curve {
        TimeCurve::Constant { value } => Ok(TimeFunctionShape::Constant { value: *value }),
        TimeCurve::Peak { step, value } => {
            let time = step
                .checked_sub(1)
                .and_then(|i| steps.get(i))
                .ok_or_else(|| {
                    SynthesisError::not_found(format!(
                        "time step {step} of peak function {}",
                        function.id
                    ))
                })?;
            Ok(TimeFunctionShape::Peak {
                time: *time,
                value: *value,
            })
        }
        TimeCurve::PiecewiseLinear { values } => {
            if values.len() != steps.len() {
                return Err(SynthesisError::InvariantViolation(format!(
                    "piecewise function {} has {} values for {} time steps",
                    function.id,
                    values.len(),
                    steps.len()
                )));
            }
            Ok(TimeFunctionShape::PiecewiseLinear {
                points: steps.iter().copied().zip(values.iter().copied()).collect(),
            })
        }
    }
}

fn add_time_functions(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let mut functions: Vec<&TimeFunction> = ctx.model.time_functions.iter().collect();
    functions.sort_by_key(|f| f.id);
    for function in functions {
        let shape = time_function_shape(function, &ctx.model.metadata.time_steps)?;
        let id = ctx
            .registry
            .add_time_function(TimeFunctionRecord::new(shape));
        ctx.time_functions.insert(function.id, id);
    }
    Ok(())
}

fn add_materials(ctx: &mut SynthesisContext<'_>) {
    let model = ctx.model;
    for attribute in model.attributes_where(|k| matches!(k, AttributeKind::Material { .. })) {
        let id = ctx.registry.add_material(MaterialRecord::new(
            attribute.name.clone(),
            attribute.params.clone(),
        ));
        ctx.materials.insert(attribute.id, id);
    }
}

fn add_cross_sections(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let model = ctx.model;
    for attribute in
        model.attributes_where(|k| matches!(k, AttributeKind::CrossSection { .. }))
    {
        let AttributeKind::CrossSection { material } = attribute.kind else {
            continue;
        };
        let material_record = ctx.materials.get(&material).copied().ok_or_else(|| {
            SynthesisError::not_found(format!(
                "material {material} of cross-section {} ({})",
                attribute.id, attribute.name
            ))
        })?;
        let set = ctx.resolver.resolve(attribute)?;

        let is_soil = ctx
            .model
            .attribute(material)
            .is_some_and(Attribute::is_soil_material);
        if is_soil {
            ctx.soil_sections.push(SoilSection {
                attribute: attribute.id,
                name: attribute.name.clone(),
                params: attribute.params.clone(),
                material: material_record,
                elements: set.elements.clone(),
            });
            continue;
        }

        let set_id = ctx.add_resolved_set(&attribute.name, &set)?;
        ctx.registry.add_cross_section(CrossSectionRecord::new(
            attribute.name.clone(),
            attribute.params.clone(),
            material_record,
            set_id,
            SectionRole::Declared,
        ))?;
        defer_partial(ctx, attribute, set_id, set);
    }
    Ok(())
}

fn add_boundary_conditions(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let model = ctx.model;
    for attribute in
        model.attributes_where(|k| matches!(k, AttributeKind::BoundaryCondition { .. }))
    {
        let set = ctx.resolver.resolve(attribute)?;
        let set_id = ctx.add_resolved_set(&attribute.name, &set)?;
        let time_function = match attribute.time_function {
            Some(id) => ctx.time_functions.get(&id).copied().ok_or_else(|| {
                SynthesisError::not_found(format!(
                    "time function {id} of boundary condition {} ({})",
                    attribute.id, attribute.name
                ))
            })?,
            None => ctx.default_time_function(),
        };
        ctx.registry
            .add_boundary_condition(BoundaryConditionRecord::new(
                attribute.name.clone(),
                attribute.params.clone(),
                time_function,
                set_id,
            ))?;
        defer_partial(ctx, attribute, set_id, set);
    }
    Ok(())
}

fn defer_partial(
    ctx: &mut SynthesisContext<'_>,
    attribute: &Attribute,
    set: u32,
    resolved: MeshEntitySet,
) {
    if resolved.deferred.is_empty() {
        return;
    }
    ctx.pending_splits.push(PendingSplit {
        attribute: attribute.id,
        set,
        scope: attribute.kind.scope(),
        spans: resolved.deferred,
    });
}
