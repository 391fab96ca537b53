//! Records the solver needs beyond the declared attributes: hinges, dummy
//! sections, drilling rotations, subsoil supports and local axes.

mod common;

use common::*;
use ofx_deck::{ElementRole, IdSpace, SectionRole};
use ofx_model::{
    Attribute, AttributeKind, Dimension, ElementKind, Geometry, Mesh, MeshElement, MeshNode,
    Model, Scope, Target,
};
use ofx_synth::{ErrorCategory, Synthesizer};

fn hinge(id: u32, beam: u32, springs: Vec<u32>, vertex: u32) -> Attribute {
    Attribute::new(id, "end release", AttributeKind::Hinge { beam, springs })
        .with_target(Target::Vertex { vertex })
}

fn rotational_spring(id: u32) -> Attribute {
    Attribute::new(id, "Spring", AttributeKind::Spring).with_params("mode 3 k 1e6")
}

#[test]
fn test_hinge_adds_rigid_arm_node_and_spring() {
    let mut model = two_element_beam_model();
    model.attributes.push(hinge(4, 1, vec![5], 3));
    model.attributes.push(rotational_spring(5));

    let synthesis = synthesize(&model);
    let records = synthesis.deck.records();

    let rigid = records.node(4).expect("rigid-arm node");
    assert_coords(rigid.coords, [5.0, 0.0, 0.0]);
    assert_eq!(rigid.master(), Some(2));

    // the lowest-id element at the hinge node is released
    assert_eq!(records.element(1).expect("released").nodes, vec![1, 4]);
    assert_eq!(records.element(2).expect("untouched").nodes, vec![2, 3]);

    let spring = records.element(3).expect("spring");
    assert_eq!(spring.nodes, vec![2, 4]);
    assert_eq!(spring.type_name, "Spring");
    assert_eq!(spring.role, ElementRole::Spring);

    let text = synthesis.text();
    assert!(text.contains(
        "rigidarmnode 4 coords 3 5 0 0 master 2 mastermask 6 1 1 1 0 0 0 doftype 6 2 2 2 0 0 0"
    ));
    assert!(text.contains("Spring 3 nodes 2 2 4 mode 3 k 1e6"));

    assert_eq!(synthesis.report.hinges, 1);
    assert_eq!(synthesis.report.spring_elements, 1);
    // the spring has no declared section
    assert_eq!(synthesis.report.dummy_elements, 1);
    reparse(&synthesis);
}

#[test]
fn test_hinge_without_beam_element_is_not_found() {
    let mut model = two_element_beam_model();
    model.attributes.push(hinge(4, 9, vec![5], 3));
    model.attributes.push(rotational_spring(5));

    let err = Synthesizer::default()
        .synthesize(&model)
        .expect_err("macro 9 has no elements");
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[test]
fn test_hinge_on_slab_macro_is_unsupported() {
    let mut model = two_element_beam_model();
    model.geometry.macros[0].code = "SLAB".to_string();
    model.attributes.push(hinge(4, 1, vec![5], 3));
    model.attributes.push(rotational_spring(5));

    let err = Synthesizer::default()
        .synthesize(&model)
        .expect_err("slabs have no beam ends");
    assert_eq!(err.category(), ErrorCategory::UnsupportedFeature);
}

#[test]
fn test_unknown_macro_code_is_unsupported() {
    let mut model = beam_model();
    model.geometry.macros[0].code = "STAIRCASE".to_string();

    let err = Synthesizer::default()
        .synthesize(&model)
        .expect_err("no mapping for stair macros");
    assert_eq!(err.category(), ErrorCategory::UnsupportedFeature);
    assert!(err.to_string().contains("STAIRCASE"), "{err}");
}

#[test]
fn test_hinge_spring_must_be_a_spring() {
    let mut model = two_element_beam_model();
    // attribute 1 is the beam material
    model.attributes.push(hinge(4, 1, vec![1], 3));

    let err = Synthesizer::default()
        .synthesize(&model)
        .expect_err("material is not a spring");
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[test]
fn test_springs_without_section_share_one_dummy() {
    let mut mesh = Mesh::new();
    mesh.add_node(MeshNode::new(1, 0.0, 0.0, 0.0).on_vertex(1));
    mesh.add_node(MeshNode::new(2, 3.0, 0.0, 0.0).on_vertex(2));
    mesh.add_element(MeshElement::new(1, ElementKind::Point, vec![1]));
    mesh.add_element(MeshElement::new(2, ElementKind::Point, vec![2]));
    let model = Model {
        metadata: metadata(Dimension::Spatial),
        geometry: Geometry {
            vertices: vec![vertex(1, [0.0, 0.0, 0.0]), vertex(2, [3.0, 0.0, 0.0])],
            ..Geometry::default()
        },
        meshes: vec![mesh],
        attributes: vec![
            Attribute::new(1, "NodalSpring", AttributeKind::Spring)
                .with_params("dofmask 6 1 1 1 0 0 0 k 6 1e6 1e6 1e6 0 0 0")
                .with_target(Target::Vertex { vertex: 1 })
                .with_target(Target::Vertex { vertex: 2 }),
        ],
        ..Model::default()
    };

    let synthesis = synthesize(&model);
    let records = synthesis.deck.records();

    assert!(records.elements().all(|e| e.type_name == "NodalSpring"));
    assert_eq!(records.len(IdSpace::Material), 1);
    assert_eq!(records.len(IdSpace::CrossSection), 1);
    let dummy = records.cross_section(1).expect("dummy section");
    assert_eq!(dummy.role, SectionRole::Dummy);
    assert_eq!(set_of_section(&synthesis, dummy).elements, vec![1, 2]);
    assert_eq!(records.material(dummy.material).expect("dummy material").name, "IsoLE");
    assert_eq!(synthesis.report.spring_elements, 2);
    reparse(&synthesis);
}

#[test]
fn test_covered_model_gets_no_dummy() {
    let synthesis = synthesize(&beam_model());
    let records = synthesis.deck.records();

    assert_eq!(records.len(IdSpace::Material), 1);
    assert!(records.cross_sections().all(|cs| cs.role == SectionRole::Declared));
    assert_eq!(synthesis.report.dummy_elements, 0);
}

#[test]
fn test_three_shells_on_four_nodes_at_z_zero_fix_rotation_about_z() {
    let synthesis = synthesize(&slab_model([0.0; 4]));
    assert_eq!(synthesis.deck.records().len(IdSpace::Element), 3);

    let fixation = boundary_condition(&synthesis, "BoundaryCondition");
    assert_eq!(fixation.params, "dofs 1 6 values 1 0");
    assert_eq!(
        set_of_boundary_condition(&synthesis, "BoundaryCondition").nodes,
        vec![1, 2, 3, 4]
    );
    assert_eq!(synthesis.report.rotation_axis, Some('Z'));
    assert!(synthesis.deck.records().elements().all(|e| e.type_name == "TR_SHELL01"));
    reparse(&synthesis);
}

#[test]
fn test_shells_in_a_vertical_plane_fix_rotation_about_y() {
    let mut model = slab_model([0.0; 4]);
    // rotate the slab into the XZ plane
    let mesh = &mut model.meshes[0];
    for node in &mut mesh.nodes {
        let [x, y, _] = node.coords;
        node.coords = [x, 2.5, y];
    }

    let synthesis = synthesize(&model);
    assert_eq!(
        boundary_condition(&synthesis, "BoundaryCondition").params,
        "dofs 1 5 values 1 0"
    );
    assert_eq!(synthesis.report.rotation_axis, Some('Y'));
}

#[test]
fn test_tilted_shells_are_ambiguous() {
    let err = Synthesizer::default()
        .synthesize(&slab_model([0.0, 0.0, 0.5, 0.0]))
        .expect_err("no common global plane");
    assert_eq!(err.category(), ErrorCategory::AmbiguousInput);
}

#[test]
fn test_planar_models_skip_rotation_fixation() {
    let mut model = slab_model([0.0; 4]);
    model.metadata.dimension = Dimension::Planar;

    let synthesis = synthesize(&model);
    let records = synthesis.deck.records();
    assert_eq!(records.len(IdSpace::BoundaryCondition), 0);
    assert_eq!(synthesis.report.rotation_axis, None);
    assert!(records.elements().all(|e| e.type_name == "TrPlaneStress2d"));
    assert_eq!(synthesis.report.domain, "2dPlaneStress");
}

#[test]
fn test_soil_section_clones_supported_shells() {
    let mut model = slab_model([0.0; 4]);
    model.attributes.push(
        Attribute::new(3, "WinklerPasternak", AttributeKind::Material { soil: true })
            .with_params("c1 5e6 c2 0"),
    );
    model.attributes.push(
        Attribute::new(4, "SimpleCS", AttributeKind::CrossSection { material: 3 })
            .with_params("thick 0.3")
            .with_target(Target::Macro { owner: 1 }),
    );

    let synthesis = synthesize(&model);
    let records = synthesis.deck.records();

    let clones: Vec<_> = records
        .elements()
        .filter(|e| e.role == ElementRole::Subsoil)
        .collect();
    assert_eq!(clones.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 5, 6]);
    for (clone, original) in clones.iter().zip(1..=3) {
        assert_eq!(clone.type_name, "Tria1PlateSubSoil");
        assert_eq!(
            clone.nodes,
            records.element(original).expect("shell").nodes
        );
    }

    let subsoil = records
        .cross_sections()
        .find(|cs| cs.role == SectionRole::Subsoil)
        .expect("subsoil section");
    assert_eq!(subsoil.params, "thick 0.3");
    assert_eq!(set_of_section(&synthesis, subsoil).elements, vec![4, 5, 6]);
    assert_eq!(
        records.material(subsoil.material).expect("soil material").name,
        "WinklerPasternak"
    );
    assert_eq!(synthesis.report.subsoil_elements, 3);
    assert_eq!(synthesis.report.dummy_elements, 0);
    reparse(&synthesis);
}

#[test]
fn test_local_axes_override_element_params() {
    let mut model = beam_model();
    model.attributes.push(
        Attribute::new(4, "beam axes", AttributeKind::LocalCoordinateSystem)
            .with_params("zaxis 3 0 1 0")
            .with_target(Target::Macro { owner: 1 }),
    );

    let synthesis = synthesize(&model);
    assert_eq!(
        synthesis.deck.records().element(1).expect("beam").params,
        "zaxis 3 0 1 0"
    );
    assert_eq!(synthesis.report.local_axes_overrides, 1);
    assert!(synthesis.text().contains("Beam3d 1 nodes 2 1 2 zaxis 3 0 1 0"));
}

#[test]
fn test_local_axes_leave_spring_params_alone() {
    let mut model = beam_model();
    model.meshes[0].add_element(MeshElement::new(2, ElementKind::Point, vec![2]));
    model.attributes.push(
        Attribute::new(4, "NodalSpring", AttributeKind::Spring)
            .with_params("dofmask 6 1 1 1 0 0 0 k 6 1e6 1e6 1e6 0 0 0")
            .with_target(Target::Vertex { vertex: 2 }),
    );
    model.attributes.push(
        Attribute::new(5, "axes", AttributeKind::LocalCoordinateSystem)
            .with_params("zaxis 3 0 1 0")
            .with_target(Target::Macro { owner: 1 })
            .with_target(Target::Vertex { vertex: 2 }),
    );

    let synthesis = synthesize(&model);
    let records = synthesis.deck.records();
    assert_eq!(records.element(1).expect("beam").params, "zaxis 3 0 1 0");
    let spring = records.element(2).expect("spring");
    assert_eq!(spring.role, ElementRole::Spring);
    assert_eq!(spring.params, "dofmask 6 1 1 1 0 0 0 k 6 1e6 1e6 1e6 0 0 0");
    assert_eq!(synthesis.report.local_axes_overrides, 1);
    reparse(&synthesis);
}

#[test]
fn test_orphan_curve_target_emits_empty_set() {
    let mut model = beam_model();
    model.attributes.push(
        Attribute::new(
            4,
            "NodalLoad",
            AttributeKind::BoundaryCondition {
                scope: Scope::Nodes,
            },
        )
        .with_params("components 6 0 0 -1 0 0 0")
        .with_target(Target::Curve {
            curve: 99,
            owner: None,
            range: None,
        }),
    );

    let synthesis = synthesize(&model);
    let set = set_of_boundary_condition(&synthesis, "NodalLoad");
    assert!(set.is_empty());
    assert_eq!(synthesis.report.empty_sets, 1);
    assert!(synthesis.text().lines().any(|line| line == format!("Set {}", set.id)));
    reparse(&synthesis);
}
