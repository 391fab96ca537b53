//! Synthesis configuration.
//!
//! Everything here has a working default; a JSON file only needs the keys it
//! changes.

use std::fs;
use std::path::Path;

use ofx_deck::ExportModule;
use ofx_model::{Dimension, ElementKind};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};

/// Solver element names per element kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeNames {
    pub point: String,
    pub line: String,
    pub triangle: String,
    pub quad: String,
}

impl ElementTypeNames {
    pub fn for_kind(&self, kind: ElementKind) -> &str {
        match kind {
            ElementKind::Point => &self.point,
            ElementKind::Line => &self.line,
            ElementKind::Triangle => &self.triangle,
            ElementKind::Quad => &self.quad,
        }
    }

    fn planar() -> Self {
        Self {
            point: "NodalSpring".to_string(),
            line: "Beam2d".to_string(),
            triangle: "TrPlaneStress2d".to_string(),
            quad: "PlaneStress2d".to_string(),
        }
    }

    fn spatial() -> Self {
        Self {
            point: "NodalSpring".to_string(),
            line: "Beam3d".to_string(),
            triangle: "TR_SHELL01".to_string(),
            quad: "MITC4Shell".to_string(),
        }
    }
}

/// Soil-support element names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsoilTypeNames {
    pub triangle: String,
    pub quad: String,
}

impl Default for SubsoilTypeNames {
    fn default() -> Self {
        Self {
            triangle: "Tria1PlateSubSoil".to_string(),
            quad: "Quad1PlateSubSoil".to_string(),
        }
    }
}

/// Name and parameter string of a synthesized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTemplate {
    pub name: String,
    #[serde(default)]
    pub params: String,
}

impl RecordTemplate {
    fn new(name: &str, params: &str) -> Self {
        Self {
            name: name.to_string(),
            params: params.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Solver output file; `<task>.out` when unset
    pub output_file: Option<String>,
    pub engineering_model: String,
    pub engineering_model_params: String,
    pub output_manager: String,
    pub export_modules: Vec<ExportModule>,
    pub planar_elements: ElementTypeNames,
    pub spatial_elements: ElementTypeNames,
    pub subsoil_elements: SubsoilTypeNames,
    /// Parameters of hinge rigid-arm nodes (rotations released)
    pub rigid_arm_params: String,
    /// Element name for hinge springs declared without one
    pub spring_element: String,
    pub dummy_material: RecordTemplate,
    pub dummy_cross_section: RecordTemplate,
    /// Boundary-condition record used to fix shell drilling rotations
    pub rotation_fixation: String,
    /// Value of the constant function shared by loads declared without one
    pub default_time_function_value: f64,
    /// Absolute tolerance for coordinate equality
    pub coordinate_tolerance: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            output_file: None,
            engineering_model: "LinearStatic".to_string(),
            engineering_model_params: String::new(),
            output_manager: "tstep_all dofman_all element_all".to_string(),
            export_modules: vec![ExportModule::VtkXml {
                primvars: vec![1],
                vars: Vec::new(),
                cellvars: Vec::new(),
            }],
            planar_elements: ElementTypeNames::planar(),
            spatial_elements: ElementTypeNames::spatial(),
            subsoil_elements: SubsoilTypeNames::default(),
            rigid_arm_params: "mastermask 6 1 1 1 0 0 0 doftype 6 2 2 2 0 0 0".to_string(),
            spring_element: "Spring".to_string(),
            dummy_material: RecordTemplate::new("IsoLE", "d 0 E 1 n 0.2 tAlpha 0"),
            dummy_cross_section: RecordTemplate::new("SimpleCS", "area 1 Iy 1 Iz 1 Ik 1 thick 1"),
            rotation_fixation: "BoundaryCondition".to_string(),
            default_time_function_value: 1.0,
            coordinate_tolerance: 1e-9,
        }
    }
}

impl SynthesisConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| SynthesisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            SynthesisError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.coordinate_tolerance.is_nan() || self.coordinate_tolerance < 0.0 {
            return Err(SynthesisError::Config(format!(
                "coordinate_tolerance must be non-negative, got {}",
                self.coordinate_tolerance
            )));
        }
        if self.engineering_model.trim().is_empty() {
            return Err(SynthesisError::Config(
                "engineering_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn element_types(&self, dimension: Dimension) -> &ElementTypeNames {
        match dimension {
            Dimension::Planar => &self.planar_elements,
            Dimension::Spatial => &self.spatial_elements,
        }
    }
}
