//! Solver-facing records.
//!
//! Each record carries only what it needs to print itself. Cross-record
//! references are plain ids into the registry's id-spaces.

use std::fmt::{Display, Formatter};

use ofx_model::ElementKind;

/// Independent identifier spaces of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdSpace {
    /// Plain and rigid-arm nodes share one space
    Node,
    Element,
    Material,
    CrossSection,
    BoundaryCondition,
    TimeFunction,
    Set,
}

impl IdSpace {
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Display for IdSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IdSpace::Node => "node",
            IdSpace::Element => "element",
            IdSpace::Material => "material",
            IdSpace::CrossSection => "cross-section",
            IdSpace::BoundaryCondition => "boundary condition",
            IdSpace::TimeFunction => "time function",
            IdSpace::Set => "set",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeRole {
    Plain,
    /// Rigidly linked to `master`; `params` carries mask/doftype settings
    RigidArm { master: u32, params: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: u32,
    pub coords: [f64; 3],
    pub role: NodeRole,
}

impl NodeRecord {
    pub fn plain(coords: [f64; 3]) -> Self {
        Self {
            id: 0,
            coords,
            role: NodeRole::Plain,
        }
    }

    pub fn rigid_arm(coords: [f64; 3], master: u32, params: impl Into<String>) -> Self {
        Self {
            id: 0,
            coords,
            role: NodeRole::RigidArm {
                master,
                params: params.into(),
            },
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn master(&self) -> Option<u32> {
        match self.role {
            NodeRole::RigidArm { master, .. } => Some(master),
            NodeRole::Plain => None,
        }
    }
}

/// Why an element exists in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// Imported from the mesh (or split from an imported element)
    Structural,
    /// Nodal or hinge spring
    Spring,
    /// Parallel soil-support element
    Subsoil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub id: u32,
    pub kind: ElementKind,
    /// Solver element name, e.g. `Beam3d`
    pub type_name: String,
    pub nodes: Vec<u32>,
    pub params: String,
    pub role: ElementRole,
}

impl ElementRecord {
    pub fn new(kind: ElementKind, type_name: impl Into<String>, nodes: Vec<u32>) -> Self {
        Self {
            id: 0,
            kind,
            type_name: type_name.into(),
            nodes,
            params: String::new(),
            role: ElementRole::Structural,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    pub fn with_role(mut self, role: ElementRole) -> Self {
        self.role = role;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub id: u32,
    pub name: String,
    pub params: String,
}

impl MaterialRecord {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            params: params.into(),
        }
    }
}

/// Origin of a cross-section; only declared sections become export regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRole {
    Declared,
    Dummy,
    Subsoil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionRecord {
    pub id: u32,
    pub name: String,
    pub params: String,
    pub material: u32,
    pub set: u32,
    pub role: SectionRole,
}

impl CrossSectionRecord {
    pub fn new(
        name: impl Into<String>,
        params: impl Into<String>,
        material: u32,
        set: u32,
        role: SectionRole,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            params: params.into(),
            material,
            set,
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConditionRecord {
    pub id: u32,
    pub name: String,
    pub params: String,
    pub time_function: u32,
    pub set: u32,
}

impl BoundaryConditionRecord {
    pub fn new(
        name: impl Into<String>,
        params: impl Into<String>,
        time_function: u32,
        set: u32,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            params: params.into(),
            time_function,
            set,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeFunctionShape {
    Constant { value: f64 },
    Peak { time: f64, value: f64 },
    /// (time, value) points in time order
    PiecewiseLinear { points: Vec<(f64, f64)> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeFunctionRecord {
    pub id: u32,
    pub shape: TimeFunctionShape,
}

impl TimeFunctionRecord {
    pub fn new(shape: TimeFunctionShape) -> Self {
        Self { id: 0, shape }
    }
}

/// How a set holds an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Whole,
    Edge(u8),
    Surface(u8),
}

/// Solver-facing collection of mesh members.
///
/// Member lists stay sorted and free of duplicates; the registry maintains
/// that when it inserts or extends a set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetRecord {
    pub id: u32,
    pub nodes: Vec<u32>,
    pub elements: Vec<u32>,
    pub edges: Vec<(u32, u8)>,
    pub surfaces: Vec<(u32, u8)>,
}

impl SetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.elements.is_empty()
            && self.edges.is_empty()
            && self.surfaces.is_empty()
    }

    /// Every way this set holds `element`
    pub fn memberships_of(&self, element: u32) -> Vec<Membership> {
        let mut found = Vec::new();
        if self.elements.binary_search(&element).is_ok() {
            found.push(Membership::Whole);
        }
        found.extend(
            self.edges
                .iter()
                .filter(|(e, _)| *e == element)
                .map(|(_, rank)| Membership::Edge(*rank)),
        );
        found.extend(
            self.surfaces
                .iter()
                .filter(|(e, _)| *e == element)
                .map(|(_, rank)| Membership::Surface(*rank)),
        );
        found
    }

    pub(crate) fn normalize(&mut self) {
        self.nodes.sort_unstable();
        self.nodes.dedup();
        self.elements.sort_unstable();
        self.elements.dedup();
        self.edges.sort_unstable();
        self.edges.dedup();
        self.surfaces.sort_unstable();
        self.surfaces.dedup();
    }
}

/// Insert into a sorted vector unless already present
pub(crate) fn insert_sorted<T: Ord>(items: &mut Vec<T>, value: T) {
    if let Err(pos) = items.binary_search(&value) {
        items.insert(pos, value);
    }
}
