//! Ordered synthesis run: population, special cases, splitting, emission.
//!
//! ## Pass order
//!
//! 1. population (nodes, elements, time functions, materials,
//!    cross-sections, boundary conditions with their sets)
//! 2. local coordinate systems
//! 3. hinges
//! 4. dummy material/cross-section
//! 5. shell drilling-rotation fixation
//! 6. subsoil elements
//! 7. partial-application splitting
//! 8. finalize and render
//!
//! The order matters: the dummy pass must see hinge springs, and splitting
//! runs last so split pieces inherit every membership created before it.

use std::path::Path;

use ofx_deck::{DeckHeader, DomainType, FinalDeck, IdSpace, render_deck, write_rendered};
use ofx_model::{Dimension, Mesh, Model};
use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::context::{SynthesisContext, SynthesisReport};
use crate::error::{Result, SynthesisError};
use crate::passes;
use crate::population::populate;
use crate::refinement::refine_partial_applications;

/// A finished run: the verified records, the header and the rendered deck
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub deck: FinalDeck,
    pub header: DeckHeader,
    pub report: SynthesisReport,
    text: String,
}

impl Synthesis {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_rendered(path, &self.text)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn synthesize(&self, model: &Model) -> Result<Synthesis> {
        self.config.validate()?;
        let mesh = model.mesh()?;
        mesh.validate().map_err(SynthesisError::InvariantViolation)?;
        let header = self.header(model, mesh);

        let mut ctx = SynthesisContext::new(model, &self.config)?;
        populate(&mut ctx)?;
        passes::apply_local_axes(&mut ctx)?;
        passes::release_hinges(&mut ctx)?;
        passes::add_dummy_section(&mut ctx)?;
        passes::fix_drilling_rotations(&mut ctx)?;
        passes::add_subsoil_elements(&mut ctx)?;
        refine_partial_applications(&mut ctx)?;

        let SynthesisContext {
            registry,
            mut report,
            ..
        } = ctx;
        report.domain = header.domain.as_str().to_string();
        report.nodes = registry.len(IdSpace::Node);
        report.elements = registry.len(IdSpace::Element);
        report.materials = registry.len(IdSpace::Material);
        report.cross_sections = registry.len(IdSpace::CrossSection);
        report.boundary_conditions = registry.len(IdSpace::BoundaryCondition);
        report.time_functions = registry.len(IdSpace::TimeFunction);
        report.sets = registry.len(IdSpace::Set);
        debug!(?report, "passes finished");

        let deck = registry.finalize()?;
        let text = render_deck(&deck, &header)?;
        info!(
            output = %header.output_file,
            nodes = report.nodes,
            elements = report.elements,
            "deck synthesized"
        );
        Ok(Synthesis {
            deck,
            header,
            report,
            text,
        })
    }

    fn header(&self, model: &Model, mesh: &Mesh) -> DeckHeader {
        let metadata = &model.metadata;
        let description = [metadata.project.trim(), metadata.task.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");
        let output_file = match &self.config.output_file {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ if metadata.task.trim().is_empty() => String::new(),
            _ => format!("{}.out", metadata.task.trim()),
        };
        DeckHeader {
            output_file,
            description,
            model_name: self.config.engineering_model.clone(),
            model_params: self.config.engineering_model_params.clone(),
            steps: metadata.time_steps.len(),
            domain: domain_type(metadata.dimension, mesh),
            output_manager: self.config.output_manager.clone(),
            export_modules: self.config.export_modules.clone(),
        }
    }
}

/// Solver domain for a model's dimensionality and element mix
pub fn domain_type(dimension: Dimension, mesh: &Mesh) -> DomainType {
    match dimension {
        Dimension::Spatial => DomainType::ThreeDShell,
        Dimension::Planar if mesh.elements.iter().any(|e| e.kind.is_surface()) => {
            DomainType::TwoDPlaneStress
        }
        Dimension::Planar => DomainType::TwoDBeam,
    }
}

/// Run synthesis with the given configuration
pub fn synthesize(model: &Model, config: &SynthesisConfig) -> Result<Synthesis> {
    Synthesizer::new(config.clone()).synthesize(model)
}
