//! Physical attributes, their geometric targets and time functions.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AttributeId, CurveId, ElementId, MacroId, SurfaceId, TimeFunctionId, VertexId};

/// Kind of mesh member an attribute's set collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Nodes,
    Elements,
    Edges,
    Surfaces,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Scope::Nodes => "nodes",
            Scope::Elements => "elements",
            Scope::Edges => "edges",
            Scope::Surfaces => "surfaces",
        };
        f.write_str(name)
    }
}

/// Geometric entity an attribute is declared on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    Vertex {
        vertex: VertexId,
    },
    /// A curve, optionally restricted to the relative range `[start, end]`.
    /// Without an owner the curve is looked up through the macro tables.
    Curve {
        curve: CurveId,
        #[serde(default)]
        owner: Option<MacroId>,
        #[serde(default)]
        range: Option<[f64; 2]>,
    },
    Surface {
        surface: SurfaceId,
    },
    Volume {
        owner: MacroId,
    },
    Macro {
        owner: MacroId,
    },
    /// Every macro in the model (self-weight and other volumetric loads)
    AllMacros,
}

impl Target {
    /// True when a curve target covers only part of its curve
    pub fn is_partial(&self) -> bool {
        match self {
            Target::Curve {
                range: Some([start, end]),
                ..
            } => *start > 0.0 || *end < 1.0,
            _ => false,
        }
    }
}

/// Per-kind attribute data. Composition (cross-section → material,
/// hinge → springs) is expressed through attribute ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeKind {
    Material {
        /// Soil-interaction material; its cross-sections get subsoil elements
        #[serde(default)]
        soil: bool,
    },
    CrossSection {
        material: AttributeId,
    },
    BoundaryCondition {
        scope: Scope,
    },
    Hinge {
        /// Beam macro whose element end is released
        beam: MacroId,
        #[serde(default)]
        springs: Vec<AttributeId>,
    },
    LocalCoordinateSystem,
    Spring,
}

impl AttributeKind {
    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::Material { .. } => "material",
            AttributeKind::CrossSection { .. } => "cross_section",
            AttributeKind::BoundaryCondition { .. } => "boundary_condition",
            AttributeKind::Hinge { .. } => "hinge",
            AttributeKind::LocalCoordinateSystem => "local_coordinate_system",
            AttributeKind::Spring => "spring",
        }
    }

    /// Scope of the set this attribute's targets resolve to
    pub fn scope(&self) -> Scope {
        match self {
            AttributeKind::BoundaryCondition { scope } => *scope,
            AttributeKind::Hinge { .. } => Scope::Nodes,
            AttributeKind::Material { .. }
            | AttributeKind::CrossSection { .. }
            | AttributeKind::LocalCoordinateSystem
            | AttributeKind::Spring => Scope::Elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    /// Solver record name (e.g. `IsoLE`, `SimpleCS`, `ConstantEdgeLoad`)
    pub name: String,
    /// Solver parameter string appended after the record id
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub time_function: Option<TimeFunctionId>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(id: AttributeId, name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            id,
            name: name.into(),
            params: String::new(),
            time_function: None,
            targets: Vec::new(),
            kind,
        }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_time_function(mut self, time_function: TimeFunctionId) -> Self {
        self.time_function = Some(time_function);
        self
    }

    pub fn is_soil_material(&self) -> bool {
        matches!(self.kind, AttributeKind::Material { soil: true })
    }
}

/// Shape of a time function over the simulation's time steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeCurve {
    Constant { value: f64 },
    /// Non-zero only at one (1-based) step
    Peak { step: usize, value: f64 },
    /// One value per time step
    PiecewiseLinear { values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFunction {
    pub id: TimeFunctionId,
    #[serde(flatten)]
    pub curve: TimeCurve,
}

/// An attribute applied to a strict sub-range of one line element.
///
/// Positions are relative to the element, measured from its first node.
/// A missing start means 0, a missing end means 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialApplication {
    pub attribute: AttributeId,
    pub element: ElementId,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

impl PartialApplication {
    pub fn span(&self) -> (f64, f64) {
        (self.start.unwrap_or(0.0), self.end.unwrap_or(1.0))
    }
}
