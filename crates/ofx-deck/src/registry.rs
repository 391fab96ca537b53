//! Append-only, id-indexed store of every record destined for the deck.
//!
//! Records are only ever inserted. After insertion the registry allows three
//! narrowly scoped edits:
//! - node substitution inside an element (hinges, line splitting)
//! - set-membership extension (split elements inheriting memberships)
//! - element parameter override (local coordinate systems)
//!
//! Every insert and edit checks referential integrity up front, so a
//! registry never holds a dangling id or an out-of-range edge/surface rank.
//! [`RecordRegistry::finalize`] hands the records over to the emitter as a
//! read-only [`FinalDeck`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DeckError, Result};
use crate::records::{
    BoundaryConditionRecord, CrossSectionRecord, ElementRecord, IdSpace, MaterialRecord,
    Membership, NodeRecord, NodeRole, SetRecord, TimeFunctionRecord, insert_sorted,
};

#[derive(Debug, Clone, Default)]
pub struct RecordRegistry {
    nodes: BTreeMap<u32, NodeRecord>,
    elements: BTreeMap<u32, ElementRecord>,
    materials: BTreeMap<u32, MaterialRecord>,
    cross_sections: BTreeMap<u32, CrossSectionRecord>,
    boundary_conditions: BTreeMap<u32, BoundaryConditionRecord>,
    time_functions: BTreeMap<u32, TimeFunctionRecord>,
    sets: BTreeMap<u32, SetRecord>,
    /// Highest id ever handed out or imported, per id-space
    high_water: [u32; 7],
}

impl RecordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest id used so far in a space (0 when empty)
    pub fn max_id(&self, space: IdSpace) -> u32 {
        self.high_water[space.index()]
    }

    /// Id the next allocating insert into `space` will receive
    pub fn next_id(&self, space: IdSpace) -> u32 {
        self.max_id(space) + 1
    }

    pub fn len(&self, space: IdSpace) -> usize {
        match space {
            IdSpace::Node => self.nodes.len(),
            IdSpace::Element => self.elements.len(),
            IdSpace::Material => self.materials.len(),
            IdSpace::CrossSection => self.cross_sections.len(),
            IdSpace::BoundaryCondition => self.boundary_conditions.len(),
            IdSpace::TimeFunction => self.time_functions.len(),
            IdSpace::Set => self.sets.len(),
        }
    }

    fn contains(&self, space: IdSpace, id: u32) -> bool {
        match space {
            IdSpace::Node => self.nodes.contains_key(&id),
            IdSpace::Element => self.elements.contains_key(&id),
            IdSpace::Material => self.materials.contains_key(&id),
            IdSpace::CrossSection => self.cross_sections.contains_key(&id),
            IdSpace::BoundaryCondition => self.boundary_conditions.contains_key(&id),
            IdSpace::TimeFunction => self.time_functions.contains_key(&id),
            IdSpace::Set => self.sets.contains_key(&id),
        }
    }

    fn require(&self, space: IdSpace, id: u32) -> Result<()> {
        if self.contains(space, id) {
            Ok(())
        } else {
            Err(DeckError::MissingRecord { space, id })
        }
    }

    fn allocate(&mut self, space: IdSpace) -> u32 {
        let slot = &mut self.high_water[space.index()];
        *slot += 1;
        *slot
    }

    /// Reserve an externally assigned id (mesh import)
    fn claim(&mut self, space: IdSpace, id: u32) -> Result<()> {
        if id == 0 {
            return Err(DeckError::ReservedId { space });
        }
        if self.contains(space, id) {
            return Err(DeckError::DuplicateId { space, id });
        }
        let slot = &mut self.high_water[space.index()];
        *slot = (*slot).max(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inserts
    // ------------------------------------------------------------------

    /// Insert a node keeping its own id
    pub fn import_node(&mut self, record: NodeRecord) -> Result<u32> {
        self.check_node(&record)?;
        self.claim(IdSpace::Node, record.id)?;
        let id = record.id;
        self.nodes.insert(id, record);
        Ok(id)
    }

    /// Insert a node under a freshly allocated id
    pub fn add_node(&mut self, mut record: NodeRecord) -> Result<u32> {
        self.check_node(&record)?;
        let id = self.allocate(IdSpace::Node);
        record.id = id;
        self.nodes.insert(id, record);
        Ok(id)
    }

    fn check_node(&self, record: &NodeRecord) -> Result<()> {
        if let NodeRole::RigidArm { master, .. } = record.role {
            self.require(IdSpace::Node, master)?;
        }
        Ok(())
    }

    /// Insert an element keeping its own id
    pub fn import_element(&mut self, record: ElementRecord) -> Result<u32> {
        self.check_element(&record)?;
        self.claim(IdSpace::Element, record.id)?;
        let id = record.id;
        self.elements.insert(id, record);
        Ok(id)
    }

    /// Insert an element under a freshly allocated id
    pub fn add_element(&mut self, mut record: ElementRecord) -> Result<u32> {
        self.check_element(&record)?;
        let id = self.allocate(IdSpace::Element);
        record.id = id;
        self.elements.insert(id, record);
        Ok(id)
    }

    fn check_element(&self, record: &ElementRecord) -> Result<()> {
        let expected = record.kind.num_nodes();
        if record.nodes.len() != expected {
            return Err(DeckError::NodeCount {
                element: record.id,
                kind: record.kind,
                expected,
                actual: record.nodes.len(),
            });
        }
        for node in &record.nodes {
            self.require(IdSpace::Node, *node)?;
        }
        Ok(())
    }

    pub fn add_material(&mut self, mut record: MaterialRecord) -> u32 {
        let id = self.allocate(IdSpace::Material);
        record.id = id;
        self.materials.insert(id, record);
        id
    }

    pub fn add_time_function(&mut self, mut record: TimeFunctionRecord) -> u32 {
        let id = self.allocate(IdSpace::TimeFunction);
        record.id = id;
        self.time_functions.insert(id, record);
        id
    }

    pub fn add_set(&mut self, mut record: SetRecord) -> Result<u32> {
        self.check_set(&record)?;
        record.normalize();
        let id = self.allocate(IdSpace::Set);
        record.id = id;
        self.sets.insert(id, record);
        Ok(id)
    }

    fn check_set(&self, record: &SetRecord) -> Result<()> {
        for node in &record.nodes {
            self.require(IdSpace::Node, *node)?;
        }
        for element in &record.elements {
            self.require(IdSpace::Element, *element)?;
        }
        for (element, rank) in &record.edges {
            self.check_rank(*element, Membership::Edge(*rank))?;
        }
        for (element, rank) in &record.surfaces {
            self.check_rank(*element, Membership::Surface(*rank))?;
        }
        Ok(())
    }

    fn check_rank(&self, element: u32, membership: Membership) -> Result<()> {
        let record = self
            .elements
            .get(&element)
            .ok_or(DeckError::MissingRecord {
                space: IdSpace::Element,
                id: element,
            })?;
        let (valid, boundary, rank) = match membership {
            Membership::Whole => return Ok(()),
            Membership::Edge(rank) => (record.kind.is_valid_edge_rank(rank), "edge", rank),
            Membership::Surface(rank) => {
                (record.kind.is_valid_surface_rank(rank), "surface", rank)
            }
        };
        if valid {
            Ok(())
        } else {
            Err(DeckError::InvalidRank {
                element,
                kind: record.kind,
                boundary,
                rank,
            })
        }
    }

    pub fn add_cross_section(&mut self, mut record: CrossSectionRecord) -> Result<u32> {
        self.require(IdSpace::Material, record.material)?;
        self.require(IdSpace::Set, record.set)?;
        let id = self.allocate(IdSpace::CrossSection);
        record.id = id;
        self.cross_sections.insert(id, record);
        Ok(id)
    }

    pub fn add_boundary_condition(&mut self, mut record: BoundaryConditionRecord) -> Result<u32> {
        self.require(IdSpace::TimeFunction, record.time_function)?;
        self.require(IdSpace::Set, record.set)?;
        let id = self.allocate(IdSpace::BoundaryCondition);
        record.id = id;
        self.boundary_conditions.insert(id, record);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Permitted edits
    // ------------------------------------------------------------------

    /// Swap the first occurrence of `old` in an element's connectivity
    pub fn replace_node_in_element(&mut self, element: u32, old: u32, new: u32) -> Result<()> {
        self.require(IdSpace::Node, new)?;
        let record = self
            .elements
            .get_mut(&element)
            .ok_or(DeckError::MissingRecord {
                space: IdSpace::Element,
                id: element,
            })?;
        let slot = record
            .nodes
            .iter_mut()
            .find(|n| **n == old)
            .ok_or(DeckError::NodeNotInElement { element, node: old })?;
        *slot = new;
        debug!(element, old, new, "replaced element node");
        Ok(())
    }

    /// Overwrite an element's parameter string
    pub fn override_element_params(&mut self, element: u32, params: &str) -> Result<()> {
        let record = self
            .elements
            .get_mut(&element)
            .ok_or(DeckError::MissingRecord {
                space: IdSpace::Element,
                id: element,
            })?;
        record.params = params.to_string();
        Ok(())
    }

    fn set_mut(&mut self, set: u32) -> Result<&mut SetRecord> {
        self.sets.get_mut(&set).ok_or(DeckError::MissingRecord {
            space: IdSpace::Set,
            id: set,
        })
    }

    pub fn extend_set_with_node(&mut self, set: u32, node: u32) -> Result<()> {
        self.require(IdSpace::Node, node)?;
        insert_sorted(&mut self.set_mut(set)?.nodes, node);
        Ok(())
    }

    pub fn extend_set_with_element(&mut self, set: u32, element: u32) -> Result<()> {
        self.require(IdSpace::Element, element)?;
        insert_sorted(&mut self.set_mut(set)?.elements, element);
        Ok(())
    }

    pub fn extend_set_with_edge(&mut self, set: u32, element: u32, rank: u8) -> Result<()> {
        self.check_rank(element, Membership::Edge(rank))?;
        insert_sorted(&mut self.set_mut(set)?.edges, (element, rank));
        Ok(())
    }

    pub fn extend_set_with_surface(&mut self, set: u32, element: u32, rank: u8) -> Result<()> {
        self.check_rank(element, Membership::Surface(rank))?;
        insert_sorted(&mut self.set_mut(set)?.surfaces, (element, rank));
        Ok(())
    }

    /// Extend a set using the same convention another element is held by
    pub fn extend_set(&mut self, set: u32, element: u32, membership: Membership) -> Result<()> {
        match membership {
            Membership::Whole => self.extend_set_with_element(set, element),
            Membership::Edge(rank) => self.extend_set_with_edge(set, element, rank),
            Membership::Surface(rank) => self.extend_set_with_surface(set, element, rank),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn node(&self, id: u32) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    pub fn element(&self, id: u32) -> Option<&ElementRecord> {
        self.elements.get(&id)
    }

    pub fn material(&self, id: u32) -> Option<&MaterialRecord> {
        self.materials.get(&id)
    }

    pub fn cross_section(&self, id: u32) -> Option<&CrossSectionRecord> {
        self.cross_sections.get(&id)
    }

    pub fn boundary_condition(&self, id: u32) -> Option<&BoundaryConditionRecord> {
        self.boundary_conditions.get(&id)
    }

    pub fn time_function(&self, id: u32) -> Option<&TimeFunctionRecord> {
        self.time_functions.get(&id)
    }

    pub fn set(&self, id: u32) -> Option<&SetRecord> {
        self.sets.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementRecord> {
        self.elements.values()
    }

    pub fn materials(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.materials.values()
    }

    pub fn cross_sections(&self) -> impl Iterator<Item = &CrossSectionRecord> {
        self.cross_sections.values()
    }

    pub fn boundary_conditions(&self) -> impl Iterator<Item = &BoundaryConditionRecord> {
        self.boundary_conditions.values()
    }

    pub fn time_functions(&self) -> impl Iterator<Item = &TimeFunctionRecord> {
        self.time_functions.values()
    }

    pub fn sets(&self) -> impl Iterator<Item = &SetRecord> {
        self.sets.values()
    }

    /// Sets holding `element`, with every membership each one uses
    pub fn sets_holding_element(&self, element: u32) -> Vec<(u32, Vec<Membership>)> {
        self.sets
            .values()
            .filter_map(|set| {
                let memberships = set.memberships_of(element);
                (!memberships.is_empty()).then_some((set.id, memberships))
            })
            .collect()
    }

    /// Re-check every cross-record reference
    pub fn verify(&self) -> Result<()> {
        for node in self.nodes.values() {
            self.check_node(node)?;
        }
        for element in self.elements.values() {
            self.check_element(element)?;
        }
        for set in self.sets.values() {
            self.check_set(set)?;
        }
        for section in self.cross_sections.values() {
            self.require(IdSpace::Material, section.material)?;
            self.require(IdSpace::Set, section.set)?;
        }
        for bc in self.boundary_conditions.values() {
            self.require(IdSpace::TimeFunction, bc.time_function)?;
            self.require(IdSpace::Set, bc.set)?;
        }
        Ok(())
    }

    /// Close the registry for emission
    pub fn finalize(self) -> Result<FinalDeck> {
        self.verify()?;
        debug!(
            nodes = self.nodes.len(),
            elements = self.elements.len(),
            materials = self.materials.len(),
            cross_sections = self.cross_sections.len(),
            boundary_conditions = self.boundary_conditions.len(),
            time_functions = self.time_functions.len(),
            sets = self.sets.len(),
            "registry finalized"
        );
        Ok(FinalDeck { records: self })
    }
}

/// A verified, no longer editable record set
#[derive(Debug, Clone)]
pub struct FinalDeck {
    records: RecordRegistry,
}

impl FinalDeck {
    pub fn records(&self) -> &RecordRegistry {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ElementRole, SectionRole, TimeFunctionShape};
    use ofx_model::ElementKind;

    fn line_registry() -> RecordRegistry {
        let mut registry = RecordRegistry::new();
        registry
            .import_node(NodeRecord::plain([0.0, 0.0, 0.0]).with_id(1))
            .expect("node 1");
        registry
            .import_node(NodeRecord::plain([10.0, 0.0, 0.0]).with_id(2))
            .expect("node 2");
        registry
            .import_element(ElementRecord::new(ElementKind::Line, "Beam3d", vec![1, 2]).with_id(1))
            .expect("element 1");
        registry
    }

    #[test]
    fn allocation_continues_after_imported_ids() {
        let mut registry = line_registry();
        registry
            .import_node(NodeRecord::plain([0.0, 5.0, 0.0]).with_id(40))
            .expect("sparse node id");
        let id = registry
            .add_node(NodeRecord::plain([0.0, 6.0, 0.0]))
            .expect("allocated node");
        assert_eq!(id, 41);
        assert_eq!(registry.max_id(IdSpace::Node), 41);
        assert_eq!(registry.next_id(IdSpace::Element), 2);
    }

    #[test]
    fn rejects_duplicate_and_reserved_ids() {
        let mut registry = line_registry();
        let dup = registry.import_node(NodeRecord::plain([1.0, 1.0, 1.0]).with_id(2));
        assert!(matches!(
            dup,
            Err(DeckError::DuplicateId {
                space: IdSpace::Node,
                id: 2
            })
        ));
        let zero = registry.import_node(NodeRecord::plain([1.0, 1.0, 1.0]));
        assert!(matches!(zero, Err(DeckError::ReservedId { .. })));
    }

    #[test]
    fn rejects_element_with_unknown_node() {
        let mut registry = line_registry();
        let err = registry
            .add_element(ElementRecord::new(ElementKind::Line, "Beam3d", vec![1, 9]))
            .expect_err("node 9 missing");
        assert!(matches!(
            err,
            DeckError::MissingRecord {
                space: IdSpace::Node,
                id: 9
            }
        ));
    }

    #[test]
    fn rejects_invalid_edge_rank() {
        let mut registry = line_registry();
        let set = SetRecord {
            edges: vec![(1, 2)],
            ..SetRecord::new()
        };
        let err = registry.add_set(set).expect_err("line has only edge 1");
        assert!(matches!(err, DeckError::InvalidRank { rank: 2, .. }));

        let set_id = registry.add_set(SetRecord::new()).expect("empty set");
        assert!(registry.extend_set_with_surface(set_id, 1, 3).is_err());
        registry
            .extend_set_with_edge(set_id, 1, 1)
            .expect("edge 1 is valid");
    }

    #[test]
    fn node_substitution_requires_existing_nodes() {
        let mut registry = line_registry();
        let mid = registry
            .add_node(NodeRecord::plain([5.0, 0.0, 0.0]))
            .expect("mid node");
        assert!(matches!(
            registry.replace_node_in_element(1, 7, mid),
            Err(DeckError::NodeNotInElement { element: 1, node: 7 })
        ));
        registry
            .replace_node_in_element(1, 2, mid)
            .expect("substitution");
        assert_eq!(registry.element(1).map(|e| e.nodes.clone()), Some(vec![1, mid]));
    }

    #[test]
    fn cross_section_needs_material_and_set() {
        let mut registry = line_registry();
        let orphan = CrossSectionRecord::new("SimpleCS", "area 1", 1, 1, SectionRole::Declared);
        assert!(registry.add_cross_section(orphan).is_err());

        let material = registry.add_material(MaterialRecord::new("IsoLE", "d 1 E 1 n 0.2"));
        let set = registry
            .add_set(SetRecord {
                elements: vec![1],
                ..SetRecord::new()
            })
            .expect("set");
        let section = registry
            .add_cross_section(CrossSectionRecord::new(
                "SimpleCS",
                "area 1",
                material,
                set,
                SectionRole::Declared,
            ))
            .expect("section");
        assert_eq!(section, 1);
    }

    #[test]
    fn finds_every_set_holding_an_element() {
        let mut registry = line_registry();
        let whole = registry
            .add_set(SetRecord {
                elements: vec![1],
                ..SetRecord::new()
            })
            .expect("whole");
        let edge = registry
            .add_set(SetRecord {
                edges: vec![(1, 1)],
                ..SetRecord::new()
            })
            .expect("edge");
        registry
            .add_set(SetRecord {
                nodes: vec![1, 2],
                ..SetRecord::new()
            })
            .expect("nodes only");

        let holding = registry.sets_holding_element(1);
        assert_eq!(
            holding,
            vec![
                (whole, vec![Membership::Whole]),
                (edge, vec![Membership::Edge(1)])
            ]
        );
    }

    #[test]
    fn finalize_exposes_records_in_id_order() {
        let mut registry = line_registry();
        registry
            .add_element(
                ElementRecord::new(ElementKind::Line, "Spring", vec![2, 1])
                    .with_role(ElementRole::Spring),
            )
            .expect("spring");
        registry.add_time_function(TimeFunctionRecord::new(TimeFunctionShape::Constant {
            value: 1.0,
        }));
        let deck = registry.finalize().expect("finalize");
        let ids: Vec<u32> = deck.records().elements().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(deck.records().len(IdSpace::TimeFunction), 1);
    }
}
