use std::collections::BTreeSet;

use ofx_deck::{CrossSectionRecord, MaterialRecord, SectionRole, SetRecord};
use tracing::debug;

use crate::context::SynthesisContext;
use crate::error::Result;

/// Bind every element outside all cross-section sets (springs, auxiliary
/// elements) to one dummy material and cross-section. Adds nothing when
/// every element is covered.
pub fn add_dummy_section(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let registry = &ctx.registry;
    let covered: BTreeSet<u32> = registry
        .cross_sections()
        .filter_map(|cs| registry.set(cs.set))
        .flat_map(|set| {
            set.elements
                .iter()
                .copied()
                .chain(set.edges.iter().map(|(e, _)| *e))
                .chain(set.surfaces.iter().map(|(e, _)| *e))
        })
        .collect();
    let uncovered: Vec<u32> = registry
        .elements()
        .map(|e| e.id)
        .filter(|id| !covered.contains(id))
        .collect();
    if uncovered.is_empty() {
        return Ok(());
    }

    let material = ctx.registry.add_material(MaterialRecord::new(
        ctx.config.dummy_material.name.clone(),
        ctx.config.dummy_material.params.clone(),
    ));
    let set = ctx.registry.add_set(SetRecord {
        elements: uncovered.clone(),
        ..SetRecord::new()
    })?;
    ctx.registry.add_cross_section(CrossSectionRecord::new(
        ctx.config.dummy_cross_section.name.clone(),
        ctx.config.dummy_cross_section.params.clone(),
        material,
        set,
        SectionRole::Dummy,
    ))?;
    ctx.report.dummy_elements = uncovered.len();
    debug!(elements = uncovered.len(), set, "added dummy cross-section");
    Ok(())
}
