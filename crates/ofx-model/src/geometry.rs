//! Geometric entities and the macro ownership tables.

use serde::{Deserialize, Serialize};

use crate::{CurveId, MacroId, SurfaceId, VertexId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub id: CurveId,
    pub start: VertexId,
    pub end: VertexId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    /// Closed loop of curves bounding the surface
    pub boundary_curves: Vec<CurveId>,
}

/// Structural category of a macro, parsed from its vendor code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroKind {
    Beam,
    Column,
    Slab,
    Wall,
    Foundation,
    Generic,
}

impl MacroKind {
    /// Parse the macro code used by the exchange format
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "BEAM" | "RIB" => Some(MacroKind::Beam),
            "COLUMN" => Some(MacroKind::Column),
            "SLAB" | "PLATE" => Some(MacroKind::Slab),
            "WALL" => Some(MacroKind::Wall),
            "FOUNDATION" | "FOOTING" => Some(MacroKind::Foundation),
            "GENERIC" => Some(MacroKind::Generic),
            _ => None,
        }
    }
}

/// Top-level modeling unit attributes are declared on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub id: MacroId,
    /// Vendor macro code, see [`MacroKind::from_code`]
    pub code: String,
    #[serde(default)]
    pub boundary_curves: Vec<CurveId>,
    #[serde(default)]
    pub opening_curves: Vec<CurveId>,
    #[serde(default)]
    pub internal_curves: Vec<CurveId>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceId>,
}

impl Macro {
    pub fn new(id: MacroId, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            boundary_curves: Vec::new(),
            opening_curves: Vec::new(),
            internal_curves: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    pub fn kind(&self) -> Option<MacroKind> {
        MacroKind::from_code(&self.code)
    }

    /// Boundary, opening and internal curves, in that order
    pub fn own_curves(&self) -> impl Iterator<Item = CurveId> + '_ {
        self.boundary_curves
            .iter()
            .chain(&self.opening_curves)
            .chain(&self.internal_curves)
            .copied()
    }

    pub fn owns_curve(&self, curve: CurveId) -> bool {
        self.own_curves().any(|c| c == curve)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub curves: Vec<Curve>,
    #[serde(default)]
    pub surfaces: Vec<Surface>,
    #[serde(default)]
    pub macros: Vec<Macro>,
}

impl Geometry {
    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn macro_by_id(&self, id: MacroId) -> Option<&Macro> {
        self.macros.iter().find(|m| m.id == id)
    }

    /// Macros in ascending id order
    pub fn macros_by_id(&self) -> Vec<&Macro> {
        let mut macros: Vec<&Macro> = self.macros.iter().collect();
        macros.sort_by_key(|m| m.id);
        macros
    }

    /// Curves bounding the surfaces a macro owns
    pub fn surface_boundary_curves(&self, owner: &Macro) -> Vec<CurveId> {
        owner
            .surfaces
            .iter()
            .filter_map(|s| self.surface(*s))
            .flat_map(|s| s.boundary_curves.iter().copied())
            .collect()
    }

    /// Owning macro of a curve referenced without one.
    ///
    /// A curve may belong to several macros, so the search order is fixed:
    /// first the lowest-id macro holding the curve as a boundary, opening or
    /// internal curve; failing that, the lowest-id macro owning a surface
    /// whose boundary includes it.
    pub fn owner_of_curve(&self, curve: CurveId) -> Option<MacroId> {
        let macros = self.macros_by_id();
        macros
            .iter()
            .find(|m| m.owns_curve(curve))
            .or_else(|| {
                macros
                    .iter()
                    .find(|m| self.surface_boundary_curves(m).contains(&curve))
            })
            .map(|m| m.id)
    }
}
