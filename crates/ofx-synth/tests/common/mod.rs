//! Model builders shared by the synthesis integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use ofx_deck::{BoundaryConditionRecord, CrossSectionRecord, ParsedDeck, SetRecord};
use ofx_model::{
    Attribute, AttributeKind, Curve, Dimension, ElementKind, Geometry, Macro, Mesh, MeshElement,
    MeshNode, Model, PartialApplication, Scope, SimulationMetadata, Surface, Target, Vertex,
};
use ofx_synth::{Synthesis, Synthesizer};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures/models")
        .join(name)
}

pub fn metadata(dimension: Dimension) -> SimulationMetadata {
    SimulationMetadata {
        project: "Depot".to_string(),
        task: "hall".to_string(),
        dimension,
        time_steps: vec![1.0],
    }
}

pub fn vertex(id: u32, coords: [f64; 3]) -> Vertex {
    Vertex { id, coords }
}

pub fn material(id: u32) -> Attribute {
    Attribute::new(id, "IsoLE", AttributeKind::Material { soil: false })
        .with_params("d 25 E 30e9 n 0.2 tAlpha 1e-5")
}

/// Cross-section on every macro
pub fn section(id: u32, material: u32) -> Attribute {
    Attribute::new(id, "SimpleCS", AttributeKind::CrossSection { material })
        .with_params("area 0.09 Iy 6.75e-4 Iz 6.75e-4 Ik 1.14e-3 thick 0.2")
        .with_target(Target::AllMacros)
}

/// Full fixation of the node on a vertex
pub fn support(id: u32, vertex: u32) -> Attribute {
    Attribute::new(
        id,
        "BoundaryCondition",
        AttributeKind::BoundaryCondition {
            scope: Scope::Nodes,
        },
    )
    .with_params("dofs 6 1 2 3 4 5 6 values 6 0 0 0 0 0 0")
    .with_target(Target::Vertex { vertex })
}

/// Line load on the relative range of a curve
pub fn edge_load(id: u32, curve: u32, range: [f64; 2]) -> Attribute {
    Attribute::new(
        id,
        "ConstantEdgeLoad",
        AttributeKind::BoundaryCondition {
            scope: Scope::Edges,
        },
    )
    .with_params("Components 6 0 0 -10e3 0 0 0 loadType 3")
    .with_target(Target::Curve {
        curve,
        owner: None,
        range: Some(range),
    })
}

pub fn partial(attribute: u32, element: u32, start: f64, end: f64) -> PartialApplication {
    PartialApplication {
        attribute,
        element,
        start: Some(start),
        end: Some(end),
    }
}

/// One 10 m beam along X on curve 1 of beam macro 1, clamped at vertex 1.
///
/// Attributes: material 1, cross-section 2, support 3.
pub fn beam_model() -> Model {
    let mut beam = Macro::new(1, "BEAM");
    beam.boundary_curves.push(1);
    let geometry = Geometry {
        vertices: vec![vertex(1, [0.0, 0.0, 0.0]), vertex(2, [10.0, 0.0, 0.0])],
        curves: vec![Curve {
            id: 1,
            start: 1,
            end: 2,
        }],
        macros: vec![beam],
        ..Geometry::default()
    };

    let mut mesh = Mesh::new();
    mesh.add_node(MeshNode::new(1, 0.0, 0.0, 0.0).on_vertex(1));
    mesh.add_node(MeshNode::new(2, 10.0, 0.0, 0.0).on_vertex(2));
    mesh.add_element(
        MeshElement::new(1, ElementKind::Line, vec![1, 2])
            .on_curve(1)
            .owned_by(1)
            .with_params("zaxis 3 1 0 0"),
    );

    Model {
        metadata: metadata(Dimension::Spatial),
        geometry,
        meshes: vec![mesh],
        attributes: vec![material(1), section(2, 1), support(3, 1)],
        ..Model::default()
    }
}

/// The beam of [`beam_model`] meshed as two elements meeting at node 2
/// (vertex 3, mid-span).
pub fn two_element_beam_model() -> Model {
    let mut model = beam_model();
    model.geometry.vertices.push(vertex(3, [5.0, 0.0, 0.0]));

    let mut mesh = Mesh::new();
    mesh.add_node(MeshNode::new(1, 0.0, 0.0, 0.0).on_vertex(1));
    mesh.add_node(MeshNode::new(2, 5.0, 0.0, 0.0).on_vertex(3));
    mesh.add_node(MeshNode::new(3, 10.0, 0.0, 0.0).on_vertex(2));
    for (id, nodes) in [(1, vec![1, 2]), (2, vec![2, 3])] {
        mesh.add_element(
            MeshElement::new(id, ElementKind::Line, nodes)
                .on_curve(1)
                .owned_by(1),
        );
    }
    model.meshes = vec![mesh];
    model
}

/// Slab macro 1 on surface 1 bounded by curves 1-4, meshed as three
/// triangles over four nodes with the given Z coordinates.
///
/// Edge 2 of triangle 1 (nodes 2-3) lies on curve 2. Attributes: material
/// 1, cross-section 2.
pub fn slab_model(z: [f64; 4]) -> Model {
    let corners = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
    let mut slab = Macro::new(1, "SLAB");
    slab.surfaces.push(1);
    let geometry = Geometry {
        vertices: corners
            .iter()
            .zip(z)
            .enumerate()
            .map(|(i, (c, z))| vertex(i as u32 + 1, [c[0], c[1], z]))
            .collect(),
        curves: (1..=4)
            .map(|id| Curve {
                id,
                start: id,
                end: id % 4 + 1,
            })
            .collect(),
        surfaces: vec![Surface {
            id: 1,
            boundary_curves: vec![1, 2, 3, 4],
        }],
        macros: vec![slab],
    };

    let mut mesh = Mesh::new();
    for (i, (c, z)) in corners.iter().zip(z).enumerate() {
        let id = i as u32 + 1;
        mesh.add_node(MeshNode::new(id, c[0], c[1], z).on_vertex(id));
    }
    for (id, nodes) in [(1, vec![1, 2, 3]), (2, vec![1, 3, 4]), (3, vec![2, 3, 4])] {
        mesh.add_element(
            MeshElement::new(id, ElementKind::Triangle, nodes)
                .on_surface(1)
                .owned_by(1),
        );
    }
    mesh.add_edge_link(2, 1, 2);

    Model {
        metadata: metadata(Dimension::Spatial),
        geometry,
        meshes: vec![mesh],
        attributes: vec![material(1), section(2, 1)],
        ..Model::default()
    }
}

pub fn synthesize(model: &Model) -> Synthesis {
    Synthesizer::default()
        .synthesize(model)
        .expect("model should synthesize")
}

/// Re-read a synthesized deck and assert it references nothing missing
pub fn reparse(synthesis: &Synthesis) -> ParsedDeck {
    let parsed = ParsedDeck::parse_str(synthesis.text()).expect("deck should parse");
    let issues = parsed.verify();
    assert!(issues.is_empty(), "deck has dangling references: {issues:?}");
    parsed
}

pub fn boundary_condition<'a>(synthesis: &'a Synthesis, name: &str) -> &'a BoundaryConditionRecord {
    synthesis
        .deck
        .records()
        .boundary_conditions()
        .find(|bc| bc.name == name)
        .expect("boundary condition should exist")
}

pub fn set_of_boundary_condition<'a>(synthesis: &'a Synthesis, name: &str) -> &'a SetRecord {
    let bc = boundary_condition(synthesis, name);
    synthesis
        .deck
        .records()
        .set(bc.set)
        .expect("boundary condition set should exist")
}

pub fn set_of_section<'a>(synthesis: &'a Synthesis, section: &CrossSectionRecord) -> &'a SetRecord {
    synthesis
        .deck
        .records()
        .set(section.set)
        .expect("cross-section set should exist")
}

pub fn assert_coords(actual: [f64; 3], expected: [f64; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "coords {actual:?} != {expected:?}");
    }
}
