//! Mesh data produced by the mesh-import collaborator.
//!
//! A model carries exactly one mesh. Nodes may be linked back to the geometric
//! vertex they were generated from, and elements to the curve, surface and
//! macro they discretize. Those links are what attribute targets resolve
//! through.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{CurveId, ElementId, MacroId, NodeId, SurfaceId, VertexId};

/// A node in the imported mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    /// Node ID as assigned by the mesher
    pub id: NodeId,
    /// Global coordinates
    pub coords: [f64; 3],
    /// Geometric vertex this node was generated on, if any
    #[serde(default)]
    pub vertex: Option<VertexId>,
}

impl MeshNode {
    pub fn new(id: NodeId, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            coords: [x, y, z],
            vertex: None,
        }
    }

    pub fn on_vertex(mut self, vertex: VertexId) -> Self {
        self.vertex = Some(vertex);
        self
    }
}

/// Geometric kind of a mesh element.
///
/// The kind fixes the node count and the rank numbering of edges and
/// surfaces, which sets reference by `(element, rank)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Single-node element (nodal springs)
    Point,
    /// 2-node line (beams, springs)
    Line,
    /// 3-node triangle
    Triangle,
    /// 4-node quadrilateral
    Quad,
}

impl ElementKind {
    /// Number of nodes an element of this kind references
    pub fn num_nodes(self) -> usize {
        match self {
            ElementKind::Point => 1,
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
            ElementKind::Quad => 4,
        }
    }

    /// Number of edge ranks (1-based ranks run `1..=num_edges`)
    pub fn num_edges(self) -> u8 {
        match self {
            ElementKind::Point => 0,
            ElementKind::Line => 1,
            ElementKind::Triangle => 3,
            ElementKind::Quad => 4,
        }
    }

    /// Number of surface ranks. Every non-point kind exposes exactly one.
    pub fn num_surfaces(self) -> u8 {
        match self {
            ElementKind::Point => 0,
            ElementKind::Line | ElementKind::Triangle | ElementKind::Quad => 1,
        }
    }

    /// Triangles and quads, the kinds that carry shell behaviour
    pub fn is_surface(self) -> bool {
        matches!(self, ElementKind::Triangle | ElementKind::Quad)
    }

    pub fn is_valid_edge_rank(self, rank: u8) -> bool {
        rank >= 1 && rank <= self.num_edges()
    }

    pub fn is_valid_surface_rank(self, rank: u8) -> bool {
        rank >= 1 && rank <= self.num_surfaces()
    }

    /// Local node positions (0-based) spanned by an edge rank.
    ///
    /// Edge `k` joins local node `k` to local node `k + 1`, wrapping back to
    /// the first node on the closing edge of triangles and quads.
    pub fn edge_local_nodes(self, rank: u8) -> Option<(usize, usize)> {
        if !self.is_valid_edge_rank(rank) {
            return None;
        }
        let first = usize::from(rank - 1);
        let second = (first + 1) % self.num_nodes();
        Some((first, second))
    }

    /// Rank of the edge joining nodes `a` and `b` of an element with the
    /// given connectivity. Traversal direction does not matter.
    pub fn edge_rank(self, connectivity: &[NodeId], a: NodeId, b: NodeId) -> Option<u8> {
        if connectivity.len() != self.num_nodes() {
            return None;
        }
        (1..=self.num_edges()).find(|&rank| {
            self.edge_local_nodes(rank).is_some_and(|(i, j)| {
                let (p, q) = (connectivity[i], connectivity[j]);
                (p == a && q == b) || (p == b && q == a)
            })
        })
    }

    /// Number of nodes to element kind, as used when reading decks back
    pub fn from_num_nodes(count: usize) -> Option<Self> {
        match count {
            1 => Some(ElementKind::Point),
            2 => Some(ElementKind::Line),
            3 => Some(ElementKind::Triangle),
            4 => Some(ElementKind::Quad),
            _ => None,
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Point => "point",
            ElementKind::Line => "line",
            ElementKind::Triangle => "triangle",
            ElementKind::Quad => "quad",
        };
        f.write_str(name)
    }
}

/// An element in the imported mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshElement {
    /// Element ID as assigned by the mesher
    pub id: ElementId,
    pub kind: ElementKind,
    /// Ordered connectivity; order defines edge ranks
    pub nodes: Vec<NodeId>,
    /// Free-form solver parameters (e.g. `zaxis 3 0 0 1`)
    #[serde(default)]
    pub params: Option<String>,
    /// Curve a line element discretizes
    #[serde(default)]
    pub curve: Option<CurveId>,
    /// Surface a triangle/quad discretizes
    #[serde(default)]
    pub surface: Option<SurfaceId>,
    /// Macro the element was meshed for
    #[serde(default)]
    pub owner: Option<MacroId>,
}

impl MeshElement {
    pub fn new(id: ElementId, kind: ElementKind, nodes: Vec<NodeId>) -> Self {
        Self {
            id,
            kind,
            nodes,
            params: None,
            curve: None,
            surface: None,
            owner: None,
        }
    }

    pub fn on_curve(mut self, curve: CurveId) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn on_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn owned_by(mut self, owner: MacroId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Validate that the element has the node count its kind requires
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.kind.num_nodes();
        if self.nodes.len() != expected {
            return Err(format!(
                "element {} of kind {} has {} nodes but expected {}",
                self.id,
                self.kind,
                self.nodes.len(),
                expected
            ));
        }
        Ok(())
    }
}

/// Flags an element edge as lying on a geometric curve.
///
/// Shell elements do not discretize curves themselves, so the mesher records
/// which of their edges run along boundary, opening and internal curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLink {
    pub curve: CurveId,
    pub element: ElementId,
    pub rank: u8,
}

/// Complete imported mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub nodes: Vec<MeshNode>,
    pub elements: Vec<MeshElement>,
    #[serde(default)]
    pub edge_links: Vec<EdgeLink>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: MeshNode) {
        self.nodes.push(node);
    }

    pub fn add_element(&mut self, element: MeshElement) {
        self.elements.push(element);
    }

    pub fn add_edge_link(&mut self, curve: CurveId, element: ElementId, rank: u8) {
        self.edge_links.push(EdgeLink {
            curve,
            element,
            rank,
        });
    }

    pub fn node(&self, id: NodeId) -> Option<&MeshNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn element(&self, id: ElementId) -> Option<&MeshElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Node generated on the given vertex
    pub fn node_on_vertex(&self, vertex: VertexId) -> Option<&MeshNode> {
        self.nodes.iter().find(|n| n.vertex == Some(vertex))
    }

    /// Element count per kind
    pub fn element_counts(&self) -> HashMap<ElementKind, usize> {
        let mut counts = HashMap::new();
        for element in &self.elements {
            *counts.entry(element.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Check connectivity sizes and that every element and edge link refers
    /// to entities present in this mesh.
    pub fn validate(&self) -> Result<(), String> {
        let node_ids: std::collections::HashSet<NodeId> =
            self.nodes.iter().map(|n| n.id).collect();
        for element in &self.elements {
            element.validate()?;
            if let Some(missing) = element.nodes.iter().find(|n| !node_ids.contains(n)) {
                return Err(format!(
                    "element {} references non-existent node {}",
                    element.id, missing
                ));
            }
        }
        for link in &self.edge_links {
            let element = self.element(link.element).ok_or_else(|| {
                format!(
                    "edge link on curve {} references non-existent element {}",
                    link.curve, link.element
                )
            })?;
            if !element.kind.is_valid_edge_rank(link.rank) {
                return Err(format!(
                    "edge link on curve {} uses rank {} invalid for {} element {}",
                    link.curve, link.rank, element.kind, element.id
                ));
            }
        }
        Ok(())
    }
}
