//! Structural model graph consumed by the OOFEM deck synthesizer.
//!
//! This crate holds the read-only input contract:
//! - **Geometry**: vertices, curves, surfaces and the macros owning them
//! - **Mesh**: nodes and elements linked back to the geometry
//! - **Attributes**: materials, cross-sections, boundary conditions, hinges,
//!   local coordinate systems and springs, each with geometric targets
//! - **Time functions** and the side list of partial attribute applications
//!
//! Models are produced by import collaborators and exchanged as JSON.

pub mod attributes;
pub mod geometry;
pub mod mesh;
pub mod summary;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use attributes::{
    Attribute, AttributeKind, PartialApplication, Scope, Target, TimeCurve, TimeFunction,
};
pub use geometry::{Curve, Geometry, Macro, MacroKind, Surface, Vertex};
pub use mesh::{EdgeLink, ElementKind, Mesh, MeshElement, MeshNode};
pub use summary::ModelSummary;

pub type NodeId = u32;
pub type ElementId = u32;
pub type VertexId = u32;
pub type CurveId = u32;
pub type SurfaceId = u32;
pub type MacroId = u32;
pub type AttributeId = u32;
pub type TimeFunctionId = u32;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid model: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Planar models get 2-D element formulations and domain types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Planar,
    #[default]
    Spatial,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    pub project: String,
    pub task: String,
    #[serde(default)]
    pub dimension: Dimension,
    /// Ordered time of each simulation step
    #[serde(default)]
    pub time_steps: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub metadata: SimulationMetadata,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub time_functions: Vec<TimeFunction>,
    #[serde(default)]
    pub partial_applications: Vec<PartialApplication>,
}

impl Model {
    /// The model's single mesh
    pub fn mesh(&self) -> Result<&Mesh> {
        match self.meshes.as_slice() {
            [mesh] => Ok(mesh),
            [] => Err(ModelError::NotFound("model has no mesh".to_string())),
            many => Err(ModelError::Invalid(format!(
                "model has {} meshes, exactly one is supported",
                many.len()
            ))),
        }
    }

    pub fn attribute(&self, id: crate::AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Attributes matching a predicate, in ascending id order
    pub fn attributes_where(&self, pred: impl Fn(&AttributeKind) -> bool) -> Vec<&Attribute> {
        let mut found: Vec<&Attribute> =
            self.attributes.iter().filter(|a| pred(&a.kind)).collect();
        found.sort_by_key(|a| a.id);
        found
    }

    /// Partial applications registered for one attribute
    pub fn partial_applications_of(&self, attribute: AttributeId) -> Vec<PartialApplication> {
        self.partial_applications
            .iter()
            .filter(|p| p.attribute == attribute)
            .copied()
            .collect()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Read a model from a JSON file
pub fn load_model(path: impl AsRef<Path>) -> Result<Model> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write a model as pretty-printed JSON
pub fn save_model(path: impl AsRef<Path>, model: &Model) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(model)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_beam_model() -> Model {
        let mut mesh = Mesh::new();
        mesh.add_node(MeshNode::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(MeshNode::new(2, 5.0, 0.0, 0.0));
        mesh.add_element(MeshElement::new(1, ElementKind::Line, vec![1, 2]));
        Model {
            metadata: SimulationMetadata {
                project: "bridge".to_string(),
                task: "static".to_string(),
                dimension: Dimension::Spatial,
                time_steps: vec![1.0],
            },
            meshes: vec![mesh],
            ..Default::default()
        }
    }

    #[test]
    fn mesh_requires_exactly_one() {
        let mut model = one_beam_model();
        assert!(model.mesh().is_ok());

        model.meshes.push(Mesh::new());
        assert!(matches!(model.mesh(), Err(ModelError::Invalid(_))));

        model.meshes.clear();
        assert!(matches!(model.mesh(), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn save_then_load_preserves_model() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("model.json");
        let model = one_beam_model();

        save_model(&path, &model).expect("save should succeed");
        let loaded = load_model(&path).expect("load should succeed");
        assert_eq!(loaded, model);
    }

    #[test]
    fn load_model_fails_for_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_model(dir.path().join("missing.json")).expect_err("missing file");
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn attributes_where_sorts_by_id() {
        let mut model = one_beam_model();
        model.attributes = vec![
            Attribute::new(7, "IsoLE", AttributeKind::Material { soil: false }),
            Attribute::new(3, "IsoLE", AttributeKind::Material { soil: false }),
            Attribute::new(5, "SimpleCS", AttributeKind::CrossSection { material: 3 }),
        ];
        let ids: Vec<_> = model
            .attributes_where(|k| matches!(k, AttributeKind::Material { .. }))
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 7]);
    }
}
