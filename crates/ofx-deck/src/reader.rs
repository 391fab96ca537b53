//! Reader for OOFEM decks, used to re-check references in written files.
//!
//! Only the structure matters here: records are kept as whitespace-separated
//! fields with keyword lookups, not interpreted per element or material type.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use ofx_model::ElementKind;

use crate::error::{DeckError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub keyword: String,
    pub fields: Vec<String>,
    pub line: usize,
}

impl Record {
    fn parse(raw: &str, line: usize) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let keyword = parts.next()?.to_string();
        Some(Self {
            keyword,
            fields: parts.map(str::to_string).collect(),
            line,
        })
    }

    /// Numeric id following the keyword of a component record
    pub fn id(&self) -> Option<u32> {
        self.fields.first().and_then(|f| f.parse().ok())
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.eq_ignore_ascii_case(key))
    }

    pub fn value_after(&self, key: &str) -> Option<&str> {
        let pos = self.position_of(key)?;
        self.fields.get(pos + 1).map(String::as_str)
    }

    pub fn int_after(&self, key: &str) -> Option<u32> {
        self.value_after(key).and_then(|v| v.parse().ok())
    }

    /// `<key> <count> <values…>`
    pub fn int_array_after(&self, key: &str) -> Option<Vec<u32>> {
        let pos = self.position_of(key)?;
        let count: usize = self.fields.get(pos + 1)?.parse().ok()?;
        let start = pos.checked_add(2)?;
        let values = self.fields.get(start..start.checked_add(count)?)?;
        values.iter().map(|v| v.parse().ok()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentCounts {
    pub ndofman: usize,
    pub nelem: usize,
    pub ncrosssect: usize,
    pub nmat: usize,
    pub nbc: usize,
    pub nic: usize,
    pub nltf: usize,
    pub nset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDeck {
    pub output_file: String,
    pub description: String,
    pub analysis: Record,
    pub modules: Vec<Record>,
    pub domain: Record,
    pub output_manager: Record,
    pub counts: ComponentCounts,
    pub nodes: Vec<Record>,
    pub elements: Vec<Record>,
    pub cross_sections: Vec<Record>,
    pub materials: Vec<Record>,
    pub boundary_conditions: Vec<Record>,
    pub initial_conditions: Vec<Record>,
    pub time_functions: Vec<Record>,
    pub sets: Vec<Record>,
}

/// Line cursor skipping blanks and `#` comments
struct Lines<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(raw: &'a str) -> Self {
        let lines = raw
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
            .collect();
        Self { lines, pos: 0 }
    }

    fn last_line(&self) -> usize {
        self.lines.last().map(|(n, _)| *n).unwrap_or(0)
    }

    fn next_raw(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let item = self.lines.get(self.pos).copied().ok_or_else(|| DeckError::Parse {
            line: self.last_line(),
            message: format!("unexpected end of deck, expected {what}"),
        })?;
        self.pos += 1;
        Ok(item)
    }

    fn next_record(&mut self, what: &str) -> Result<Record> {
        let (line, raw) = self.next_raw(what)?;
        Record::parse(raw, line).ok_or_else(|| DeckError::Parse {
            line,
            message: format!("empty {what} record"),
        })
    }

    fn records(&mut self, count: usize, what: &str) -> Result<Vec<Record>> {
        (0..count).map(|_| self.next_record(what)).collect()
    }
}

impl ParsedDeck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| DeckError::Parse {
            line: 0,
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse_str(&raw)
    }

    pub fn parse_str(raw: &str) -> Result<Self> {
        let mut lines = Lines::new(raw);

        let (_, output_file) = lines.next_raw("output file name")?;
        let (_, description) = lines.next_raw("description")?;
        let analysis = lines.next_record("engineering model")?;
        let module_count = analysis.int_after("nmodules").ok_or(DeckError::Parse {
            line: analysis.line,
            message: "engineering model record lacks nmodules".to_string(),
        })?;
        let modules = lines.records(module_count as usize, "export module")?;

        let domain = lines.next_record("domain")?;
        if !domain.keyword.eq_ignore_ascii_case("domain") {
            return Err(DeckError::Parse {
                line: domain.line,
                message: format!("expected domain record, found '{}'", domain.keyword),
            });
        }
        let output_manager = lines.next_record("output manager")?;
        let counts_record = lines.next_record("component counts")?;
        let counts = parse_counts(&counts_record)?;

        Ok(Self {
            output_file: output_file.to_string(),
            description: description.to_string(),
            analysis,
            modules,
            domain,
            output_manager,
            counts,
            nodes: lines.records(counts.ndofman, "node")?,
            elements: lines.records(counts.nelem, "element")?,
            cross_sections: lines.records(counts.ncrosssect, "cross-section")?,
            materials: lines.records(counts.nmat, "material")?,
            boundary_conditions: lines.records(counts.nbc, "boundary condition")?,
            initial_conditions: lines.records(counts.nic, "initial condition")?,
            time_functions: lines.records(counts.nltf, "time function")?,
            sets: lines.records(counts.nset, "set")?,
        })
    }

    /// Check every cross-record reference; returns one message per problem
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let node_ids = collect_ids(&self.nodes, "node", &mut issues);
        let material_ids = collect_ids(&self.materials, "material", &mut issues);
        let tf_ids = collect_ids(&self.time_functions, "time function", &mut issues);
        let set_ids = collect_ids(&self.sets, "set", &mut issues);
        collect_ids(&self.cross_sections, "cross-section", &mut issues);
        collect_ids(&self.boundary_conditions, "boundary condition", &mut issues);

        for node in &self.nodes {
            if node.keyword.eq_ignore_ascii_case("rigidarmnode") {
                match node.int_after("master") {
                    Some(master) if node_ids.contains(&master) => {}
                    other => issues.push(format!(
                        "line {}: rigid-arm node master {:?} does not exist",
                        node.line, other
                    )),
                }
            }
        }

        let mut element_kinds = HashMap::<u32, ElementKind>::new();
        for element in &self.elements {
            let Some(id) = element.id() else {
                issues.push(format!("line {}: element without id", element.line));
                continue;
            };
            match element.int_array_after("nodes") {
                Some(nodes) => {
                    for node in nodes.iter().filter(|n| !node_ids.contains(n)) {
                        issues.push(format!(
                            "line {}: element {id} references missing node {node}",
                            element.line
                        ));
                    }
                    match ElementKind::from_num_nodes(nodes.len()) {
                        Some(kind) => {
                            element_kinds.insert(id, kind);
                        }
                        None => issues.push(format!(
                            "line {}: element {id} has unsupported node count {}",
                            element.line,
                            nodes.len()
                        )),
                    }
                }
                None => issues.push(format!(
                    "line {}: element {id} lacks a nodes array",
                    element.line
                )),
            }
        }

        for section in &self.cross_sections {
            check_ref(section, "material", &material_ids, &mut issues);
            check_ref(section, "set", &set_ids, &mut issues);
        }
        for bc in &self.boundary_conditions {
            check_ref(bc, "loadTimeFunction", &tf_ids, &mut issues);
            check_ref(bc, "set", &set_ids, &mut issues);
        }

        for set in &self.sets {
            if let Some(nodes) = set.int_array_after("nodes") {
                for node in nodes.iter().filter(|n| !node_ids.contains(n)) {
                    issues.push(format!("line {}: set references missing node {node}", set.line));
                }
            }
            if let Some(elements) = set.int_array_after("elements") {
                for element in elements.iter().filter(|e| !element_kinds.contains_key(e)) {
                    issues.push(format!(
                        "line {}: set references missing element {element}",
                        set.line
                    ));
                }
            }
            for (key, is_edge) in [("elementedges", true), ("elementboundaries", false)] {
                let Some(flat) = set.int_array_after(key) else {
                    continue;
                };
                if flat.len() % 2 != 0 {
                    issues.push(format!("line {}: odd-length {key} array", set.line));
                    continue;
                }
                for pair in flat.chunks(2) {
                    let (element, rank) = (pair[0], pair[1]);
                    let valid = element_kinds.get(&element).is_some_and(|kind| {
                        u8::try_from(rank).is_ok_and(|r| {
                            if is_edge {
                                kind.is_valid_edge_rank(r)
                            } else {
                                kind.is_valid_surface_rank(r)
                            }
                        })
                    });
                    if !valid {
                        issues.push(format!(
                            "line {}: {key} pair ({element}, {rank}) is invalid",
                            set.line
                        ));
                    }
                }
            }
        }

        for module in &self.modules {
            if let Some(regions) = module.int_array_after("regionsets") {
                for set in regions.iter().filter(|s| !set_ids.contains(s)) {
                    issues.push(format!(
                        "line {}: export region set {set} does not exist",
                        module.line
                    ));
                }
            }
        }

        issues
    }
}

fn parse_counts(record: &Record) -> Result<ComponentCounts> {
    let mut all = vec![record.keyword.clone()];
    all.extend(record.fields.iter().cloned());
    let as_record = Record {
        keyword: String::new(),
        fields: all,
        line: record.line,
    };
    let get = |key: &str| -> Result<usize> {
        as_record
            .int_after(key)
            .map(|v| v as usize)
            .ok_or_else(|| DeckError::Parse {
                line: record.line,
                message: format!("component count record lacks {key}"),
            })
    };
    Ok(ComponentCounts {
        ndofman: get("ndofman")?,
        nelem: get("nelem")?,
        ncrosssect: get("ncrosssect")?,
        nmat: get("nmat")?,
        nbc: get("nbc")?,
        nic: as_record.int_after("nic").unwrap_or(0) as usize,
        nltf: get("nltf")?,
        nset: as_record.int_after("nset").unwrap_or(0) as usize,
    })
}

fn collect_ids(records: &[Record], what: &str, issues: &mut Vec<String>) -> HashSet<u32> {
    let mut ids = HashSet::new();
    for record in records {
        match record.id() {
            Some(id) if !ids.insert(id) => {
                issues.push(format!("line {}: duplicate {what} id {id}", record.line));
            }
            Some(_) => {}
            None => issues.push(format!("line {}: {what} record without id", record.line)),
        }
    }
    ids
}

fn check_ref(record: &Record, key: &str, known: &HashSet<u32>, issues: &mut Vec<String>) {
    match record.int_after(key) {
        Some(id) if known.contains(&id) => {}
        Some(id) => issues.push(format!(
            "line {}: {} {:?} references missing {key} {id}",
            record.line,
            record.keyword,
            record.id()
        )),
        None => issues.push(format!(
            "line {}: {} {:?} lacks {key}",
            record.line,
            record.keyword,
            record.id()
        )),
    }
}
