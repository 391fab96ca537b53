//! Serializes a finalized record set into the OOFEM input grammar.
//!
//! ## Layout
//!
//! ```text
//! <output file>
//! <description>
//! <engineering model> nsteps <n> nmodules <m> [params]
//! <export module lines>
//! domain <type>
//! OutputManager <params>
//! ndofman .. nelem .. ncrosssect .. nmat .. nbc .. nic 0 nltf .. nset ..
//! nodes, elements, cross-sections, materials, boundary conditions,
//! time functions, sets
//! ```
//!
//! The solver reads records grouped by kind in exactly that order. Inside a
//! group records appear in ascending id order, which makes the output a
//! deterministic function of the registry contents.

use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};
use crate::records::{
    BoundaryConditionRecord, CrossSectionRecord, ElementRecord, IdSpace, MaterialRecord,
    NodeRecord, NodeRole, SectionRole, SetRecord, TimeFunctionRecord, TimeFunctionShape,
};
use crate::registry::FinalDeck;

/// Solver domain type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainType {
    /// Planar frames
    TwoDBeam,
    /// Planar models with surface elements
    TwoDPlaneStress,
    /// Spatial frames and shells (6 DOFs per node)
    ThreeDShell,
}

impl DomainType {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainType::TwoDBeam => "2dBeam",
            DomainType::TwoDPlaneStress => "2dPlaneStress",
            DomainType::ThreeDShell => "3dShell",
        }
    }
}

/// Result export module listed after the engineering-model record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportModule {
    /// VTK XML export over the declared cross-section regions
    VtkXml {
        #[serde(default)]
        primvars: Vec<u32>,
        #[serde(default)]
        vars: Vec<u32>,
        #[serde(default)]
        cellvars: Vec<u32>,
    },
    /// Verbatim module record
    Raw { line: String },
}

/// Header metadata that does not live in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct DeckHeader {
    pub output_file: String,
    pub description: String,
    /// Engineering model record name, e.g. `LinearStatic`
    pub model_name: String,
    pub model_params: String,
    pub steps: usize,
    pub domain: DomainType,
    pub output_manager: String,
    pub export_modules: Vec<ExportModule>,
}

impl DeckHeader {
    fn validate(&self) -> Result<()> {
        if self.output_file.trim().is_empty() {
            return Err(DeckError::MissingHeader("output file name"));
        }
        if self.description.trim().is_empty() {
            return Err(DeckError::MissingHeader("description"));
        }
        // readers skip lines starting with '#', which would shift every record
        if self.output_file.trim().starts_with('#') {
            return Err(DeckError::CommentHeader("output file name"));
        }
        if self.description.trim().starts_with('#') {
            return Err(DeckError::CommentHeader("description"));
        }
        if self.model_name.trim().is_empty() {
            return Err(DeckError::MissingHeader("engineering model name"));
        }
        if self.steps == 0 {
            return Err(DeckError::MissingHeader("simulation step count"));
        }
        Ok(())
    }
}

/// Produce every deck line in order
pub fn emit_deck(deck: &FinalDeck, header: &DeckHeader) -> Result<Vec<String>> {
    header.validate()?;
    let records = deck.records();
    let mut lines = Vec::new();

    lines.push(header.output_file.trim().to_string());
    lines.push(header.description.trim().to_string());
    lines.push(join_fields([
        header.model_name.clone(),
        format!("nsteps {}", header.steps),
        format!("nmodules {}", header.export_modules.len()),
        header.model_params.clone(),
    ]));

    let region_sets: Vec<u32> = records
        .cross_sections()
        .filter(|cs| cs.role == SectionRole::Declared)
        .map(|cs| cs.set)
        .collect();
    for module in &header.export_modules {
        lines.push(export_module_line(module, &region_sets));
    }

    lines.push(format!("domain {}", header.domain.as_str()));
    lines.push(join_fields([
        "OutputManager".to_string(),
        header.output_manager.clone(),
    ]));
    lines.push(format!(
        "ndofman {} nelem {} ncrosssect {} nmat {} nbc {} nic 0 nltf {} nset {}",
        records.len(IdSpace::Node),
        records.len(IdSpace::Element),
        records.len(IdSpace::CrossSection),
        records.len(IdSpace::Material),
        records.len(IdSpace::BoundaryCondition),
        records.len(IdSpace::TimeFunction),
        records.len(IdSpace::Set),
    ));

    lines.extend(records.nodes().map(node_line));
    lines.extend(records.elements().map(element_line));
    lines.extend(records.cross_sections().map(cross_section_line));
    lines.extend(records.materials().map(material_line));
    lines.extend(records.boundary_conditions().map(boundary_condition_line));
    lines.extend(records.time_functions().map(time_function_line));
    lines.extend(records.sets().map(set_line));

    Ok(lines)
}

/// Whole deck as one newline-terminated string
pub fn render_deck(deck: &FinalDeck, header: &DeckHeader) -> Result<String> {
    let mut text = emit_deck(deck, header)?.join("\n");
    text.push('\n');
    Ok(text)
}

pub fn node_line(node: &NodeRecord) -> String {
    let [x, y, z] = node.coords;
    let base = format!(
        "coords 3 {} {} {}",
        format_real(x),
        format_real(y),
        format_real(z)
    );
    match &node.role {
        NodeRole::Plain => format!("node {} {}", node.id, base),
        NodeRole::RigidArm { master, params } => join_fields([
            format!("rigidarmnode {} {}", node.id, base),
            format!("master {master}"),
            params.clone(),
        ]),
    }
}

pub fn element_line(element: &ElementRecord) -> String {
    join_fields([
        format!("{} {}", element.type_name, element.id),
        format!("nodes {}", int_array(&element.nodes)),
        element.params.clone(),
    ])
}

pub fn material_line(material: &MaterialRecord) -> String {
    join_fields([
        format!("{} {}", material.name, material.id),
        material.params.clone(),
    ])
}

pub fn cross_section_line(section: &CrossSectionRecord) -> String {
    join_fields([
        format!("{} {}", section.name, section.id),
        section.params.clone(),
        format!("material {} set {}", section.material, section.set),
    ])
}

pub fn boundary_condition_line(bc: &BoundaryConditionRecord) -> String {
    join_fields([
        format!("{} {}", bc.name, bc.id),
        bc.params.clone(),
        format!("loadTimeFunction {} set {}", bc.time_function, bc.set),
    ])
}

pub fn time_function_line(tf: &TimeFunctionRecord) -> String {
    match &tf.shape {
        TimeFunctionShape::Constant { value } => {
            format!("ConstantFunction {} f(t) {}", tf.id, format_real(*value))
        }
        TimeFunctionShape::Peak { time, value } => format!(
            "PeakFunction {} t {} f(t) {}",
            tf.id,
            format_real(*time),
            format_real(*value)
        ),
        TimeFunctionShape::PiecewiseLinear { points } => {
            let times: Vec<f64> = points.iter().map(|(t, _)| *t).collect();
            let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
            format!(
                "PiecewiseLinFunction {} nPoints {} t {} f(t) {}",
                tf.id,
                points.len(),
                real_array(&times),
                real_array(&values)
            )
        }
    }
}

pub fn set_line(set: &SetRecord) -> String {
    let mut fields = vec![format!("Set {}", set.id)];
    if !set.nodes.is_empty() {
        fields.push(format!("nodes {}", int_array(&set.nodes)));
    }
    if !set.elements.is_empty() {
        fields.push(format!("elements {}", int_array(&set.elements)));
    }
    if !set.edges.is_empty() {
        fields.push(format!("elementedges {}", pair_array(&set.edges)));
    }
    if !set.surfaces.is_empty() {
        fields.push(format!("elementboundaries {}", pair_array(&set.surfaces)));
    }
    fields.join(" ")
}

fn export_module_line(module: &ExportModule, region_sets: &[u32]) -> String {
    match module {
        ExportModule::VtkXml {
            primvars,
            vars,
            cellvars,
        } => {
            let mut fields = vec!["vtkxml tstep_all domain_all".to_string()];
            if !primvars.is_empty() {
                fields.push(format!("primvars {}", int_array(primvars)));
            }
            if !vars.is_empty() {
                fields.push(format!("vars {}", int_array(vars)));
            }
            if !cellvars.is_empty() {
                fields.push(format!("cellvars {}", int_array(cellvars)));
            }
            fields.push("stype 1".to_string());
            if !region_sets.is_empty() {
                fields.push(format!("regionsets {}", int_array(region_sets)));
            }
            fields.join(" ")
        }
        ExportModule::Raw { line } => line.trim().to_string(),
    }
}

/// Shortest round-trip decimal form; negative zero prints as `0`
pub fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// `<count> <values…>`
fn int_array(values: &[u32]) -> String {
    let mut out = values.len().to_string();
    for v in values {
        out.push(' ');
        out.push_str(&v.to_string());
    }
    out
}

fn real_array(values: &[f64]) -> String {
    let mut out = values.len().to_string();
    for v in values {
        out.push(' ');
        out.push_str(&format_real(*v));
    }
    out
}

/// Pairs flattened into one integer array; the count is of integers
fn pair_array(pairs: &[(u32, u8)]) -> String {
    let flat: Vec<u32> = pairs
        .iter()
        .flat_map(|(element, rank)| [*element, u32::from(*rank)])
        .collect();
    int_array(&flat)
}

fn join_fields<const N: usize>(fields: [String; N]) -> String {
    fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
