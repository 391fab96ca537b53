//! State threaded through the synthesis passes.

use std::collections::BTreeMap;

use ofx_deck::{RecordRegistry, SetRecord, TimeFunctionRecord, TimeFunctionShape};
use ofx_model::{AttributeId, Dimension, ElementKind, Mesh, Model, Scope};
use serde::Serialize;
use tracing::warn;

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::resolver::{AttributeSetResolver, DeferredSpan, MeshEntitySet};

/// A set whose attribute also applies to parts of line elements
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSplit {
    pub attribute: AttributeId,
    pub set: u32,
    pub scope: Scope,
    pub spans: Vec<DeferredSpan>,
}

/// Declared cross-section whose material is soil-interaction; its record is
/// created by the subsoil pass once the support elements exist
#[derive(Debug, Clone, PartialEq)]
pub struct SoilSection {
    pub attribute: AttributeId,
    pub name: String,
    pub params: String,
    pub material: u32,
    pub elements: Vec<u32>,
}

/// What the passes did, for logs and the CLI summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisReport {
    pub domain: String,
    pub nodes: usize,
    pub elements: usize,
    pub materials: usize,
    pub cross_sections: usize,
    pub boundary_conditions: usize,
    pub time_functions: usize,
    pub sets: usize,
    /// Sets emitted without members because their target had no owner
    pub empty_sets: usize,
    pub spring_elements: usize,
    pub local_axes_overrides: usize,
    pub hinges: usize,
    pub dummy_elements: usize,
    /// Global axis shell drilling rotations were fixed about
    pub rotation_axis: Option<char>,
    pub subsoil_elements: usize,
    pub split_elements: usize,
    pub inserted_nodes: usize,
}

pub struct SynthesisContext<'a> {
    pub model: &'a Model,
    pub mesh: &'a Mesh,
    pub config: &'a SynthesisConfig,
    pub resolver: AttributeSetResolver<'a>,
    pub registry: RecordRegistry,
    /// Model attribute id → material record id
    pub materials: BTreeMap<AttributeId, u32>,
    /// Model time function id → time function record id
    pub time_functions: BTreeMap<u32, u32>,
    pub soil_sections: Vec<SoilSection>,
    pub pending_splits: Vec<PendingSplit>,
    pub report: SynthesisReport,
    default_time_function: Option<u32>,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(model: &'a Model, config: &'a SynthesisConfig) -> Result<Self> {
        let resolver = AttributeSetResolver::new(model)?;
        Ok(Self {
            model,
            mesh: resolver.mesh(),
            config,
            resolver,
            registry: RecordRegistry::new(),
            materials: BTreeMap::new(),
            time_functions: BTreeMap::new(),
            soil_sections: Vec::new(),
            pending_splits: Vec::new(),
            report: SynthesisReport::default(),
            default_time_function: None,
        })
    }

    pub fn dimension(&self) -> Dimension {
        self.model.metadata.dimension
    }

    pub fn element_type(&self, kind: ElementKind) -> &'a str {
        self.config.element_types(self.dimension()).for_kind(kind)
    }

    /// Shared constant function for records declared without one, created
    /// on first use
    pub fn default_time_function(&mut self) -> u32 {
        if let Some(id) = self.default_time_function {
            return id;
        }
        let id = self
            .registry
            .add_time_function(TimeFunctionRecord::new(TimeFunctionShape::Constant {
                value: self.config.default_time_function_value,
            }));
        self.default_time_function = Some(id);
        id
    }

    /// Insert the set record for a resolved entity set.
    ///
    /// An empty set is still emitted so the owning record keeps a valid
    /// reference.
    pub fn add_resolved_set(&mut self, label: &str, set: &MeshEntitySet) -> Result<u32> {
        if set.is_empty() {
            warn!(label, "emitting empty set");
            self.report.empty_sets += 1;
        }
        Ok(self.registry.add_set(set.to_set_record())?)
    }

    pub fn add_set(&mut self, record: SetRecord) -> Result<u32> {
        Ok(self.registry.add_set(record)?)
    }
}
