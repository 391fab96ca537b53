use ofx_deck::{CrossSectionRecord, ElementRecord, ElementRole, SectionRole, SetRecord};
use ofx_model::ElementKind;
use tracing::{debug, warn};

use crate::context::SynthesisContext;
use crate::error::{Result, SynthesisError};

/// Clone the elements of every soil-material cross-section into subsoil
/// support elements and bind the cross-section to the clones.
pub fn add_subsoil_elements(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let sections = ctx.soil_sections.clone();
    for section in &sections {
        if section.elements.is_empty() {
            warn!(attribute = section.attribute, "soil cross-section has no elements");
        }
        let mut clones = Vec::with_capacity(section.elements.len());
        for element in &section.elements {
            let record = ctx
                .registry
                .element(*element)
                .cloned()
                .ok_or_else(|| SynthesisError::not_found(format!("element {element}")))?;
            let type_name = match record.kind {
                ElementKind::Triangle => ctx.config.subsoil_elements.triangle.clone(),
                ElementKind::Quad => ctx.config.subsoil_elements.quad.clone(),
                other => {
                    return Err(SynthesisError::unsupported(format!(
                        "subsoil support for {other} element {element}"
                    )));
                }
            };
            clones.push(ctx.registry.add_element(
                ElementRecord::new(record.kind, type_name, record.nodes)
                    .with_role(ElementRole::Subsoil),
            )?);
        }

        let set = ctx.registry.add_set(SetRecord {
            elements: clones.clone(),
            ..SetRecord::new()
        })?;
        ctx.registry.add_cross_section(CrossSectionRecord::new(
            section.name.clone(),
            section.params.clone(),
            section.material,
            set,
            SectionRole::Subsoil,
        ))?;
        ctx.report.subsoil_elements += clones.len();
        debug!(
            attribute = section.attribute,
            elements = clones.len(),
            set,
            "added subsoil elements"
        );
    }
    Ok(())
}
