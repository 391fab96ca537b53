//! Compact inventory of a model, printed by the CLI before synthesis.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{ElementKind, Model};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub project: String,
    pub task: String,
    pub mesh_count: usize,
    pub node_count: usize,
    pub element_counts: BTreeMap<String, usize>,
    pub attribute_counts: BTreeMap<String, usize>,
    pub macro_count: usize,
    pub time_function_count: usize,
    pub partial_applications: usize,
    pub time_steps: usize,
    pub has_shells: bool,
    pub has_soil: bool,
}

impl ModelSummary {
    pub fn from_model(model: &Model) -> Self {
        let mut element_counts = BTreeMap::<String, usize>::new();
        let mut attribute_counts = BTreeMap::<String, usize>::new();
        let mut node_count = 0usize;
        let mut has_shells = false;

        for mesh in &model.meshes {
            node_count += mesh.nodes.len();
            for (kind, count) in mesh.element_counts() {
                *element_counts.entry(kind.to_string()).or_insert(0) += count;
                has_shells |= matches!(kind, ElementKind::Triangle | ElementKind::Quad);
            }
        }

        for attribute in &model.attributes {
            *attribute_counts
                .entry(attribute.kind.label().to_string())
                .or_insert(0) += 1;
        }

        Self {
            project: model.metadata.project.clone(),
            task: model.metadata.task.clone(),
            mesh_count: model.meshes.len(),
            node_count,
            element_counts,
            attribute_counts,
            macro_count: model.geometry.macros.len(),
            time_function_count: model.time_functions.len(),
            partial_applications: model.partial_applications.len(),
            time_steps: model.metadata.time_steps.len(),
            has_shells,
            has_soil: model.attributes.iter().any(|a| a.is_soil_material()),
        }
    }
}
