use ofx_deck::ElementRole;
use ofx_model::AttributeKind;
use tracing::{debug, warn};

use crate::context::SynthesisContext;
use crate::error::Result;

/// Overwrite the parameter string of every element a local coordinate
/// system targets. Later attributes win on overlap. Spring elements keep
/// their stiffness parameters.
pub fn apply_local_axes(ctx: &mut SynthesisContext<'_>) -> Result<()> {
    let model = ctx.model;
    for attribute in model.attributes_where(|k| matches!(k, AttributeKind::LocalCoordinateSystem)) {
        let set = ctx.resolver.resolve(attribute)?;
        let mut applied = 0;
        for element in &set.elements {
            if ctx
                .registry
                .element(*element)
                .is_some_and(|e| e.role == ElementRole::Spring)
            {
                warn!(
                    attribute = attribute.id,
                    element, "local axes target a spring element, skipped"
                );
                continue;
            }
            ctx.registry
                .override_element_params(*element, &attribute.params)?;
            applied += 1;
        }
        ctx.report.local_axes_overrides += applied;
        debug!(
            attribute = attribute.id,
            elements = applied,
            "applied local axes"
        );
    }
    Ok(())
}
