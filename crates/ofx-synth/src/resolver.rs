//! Attribute target → mesh entity set resolution.
//!
//! Targets are geometric (vertex, curve, surface, macro); the resolver maps
//! them onto mesh members through the macro ownership tables and the
//! element → curve/surface links recorded by the mesher.
//!
//! ## Lookup order
//!
//! A curve given without its macro belongs to the lowest-id macro holding
//! it as a boundary, opening or internal curve, else to the lowest-id macro
//! owning a surface bounded by it. A surface belongs to the lowest-id macro
//! listing it. A target with no owning macro resolves to an empty set and
//! logs a warning.

use ofx_deck::SetRecord;
use ofx_model::{
    Attribute, CurveId, ElementId, ElementKind, Macro, MacroId, MacroKind, Mesh, MeshElement,
    Model, NodeId, Scope, SurfaceId, Target,
};
use tracing::warn;

use crate::error::{Result, SynthesisError};

/// Part of a line element an attribute applies to, split later
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredSpan {
    pub element: ElementId,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshEntitySet {
    pub nodes: Vec<NodeId>,
    pub elements: Vec<ElementId>,
    pub edges: Vec<(ElementId, u8)>,
    pub surfaces: Vec<(ElementId, u8)>,
    /// Partial applications waiting for element splitting
    pub deferred: Vec<DeferredSpan>,
}

impl MeshEntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_members(&self) -> bool {
        !(self.nodes.is_empty()
            && self.elements.is_empty()
            && self.edges.is_empty()
            && self.surfaces.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_members() && self.deferred.is_empty()
    }

    pub fn merge(&mut self, other: MeshEntitySet) {
        self.nodes.extend(other.nodes);
        self.elements.extend(other.elements);
        self.edges.extend(other.edges);
        self.surfaces.extend(other.surfaces);
        self.deferred.extend(other.deferred);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.nodes.sort_unstable();
        self.nodes.dedup();
        self.elements.sort_unstable();
        self.elements.dedup();
        self.edges.sort_unstable();
        self.edges.dedup();
        self.surfaces.sort_unstable();
        self.surfaces.dedup();
        self.deferred.sort_by(|a, b| {
            a.element
                .cmp(&b.element)
                .then(a.start.total_cmp(&b.start))
                .then(a.end.total_cmp(&b.end))
        });
        self.deferred.dedup();
    }

    /// Direct members as a set record; deferred spans are not included
    pub fn to_set_record(&self) -> SetRecord {
        SetRecord {
            nodes: self.nodes.clone(),
            elements: self.elements.clone(),
            edges: self.edges.clone(),
            surfaces: self.surfaces.clone(),
            ..SetRecord::new()
        }
    }
}

fn owned_by(element: &MeshElement, owner: MacroId) -> bool {
    element.owner.is_none_or(|o| o == owner)
}

pub struct AttributeSetResolver<'a> {
    model: &'a Model,
    mesh: &'a Mesh,
}

impl<'a> AttributeSetResolver<'a> {
    pub fn new(model: &'a Model) -> Result<Self> {
        Ok(Self {
            model,
            mesh: model.mesh()?,
        })
    }

    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    /// Union of all targets of an attribute in the attribute's scope.
    ///
    /// Curve targets restricted to part of their curve contribute no direct
    /// members; the covering elements and relative ranges come from the
    /// model's partial-application list instead.
    pub fn resolve(&self, attribute: &Attribute) -> Result<MeshEntitySet> {
        let scope = attribute.kind.scope();
        let mut set = MeshEntitySet::new();
        let mut has_partial_target = false;

        for target in &attribute.targets {
            if target.is_partial() {
                has_partial_target = true;
                continue;
            }
            set.merge(self.resolve_target(target, scope)?);
        }

        let partials = self.model.partial_applications_of(attribute.id);
        if has_partial_target && partials.is_empty() {
            return Err(SynthesisError::not_found(format!(
                "partial application of attribute {} ({})",
                attribute.id, attribute.name
            )));
        }
        for application in partials {
            let element = self.mesh.element(application.element).ok_or_else(|| {
                SynthesisError::not_found(format!(
                    "element {} of a partial application of attribute {}",
                    application.element, attribute.id
                ))
            })?;
            if element.kind != ElementKind::Line {
                return Err(SynthesisError::unsupported(format!(
                    "partial application of attribute {} on {} element {}",
                    attribute.id, element.kind, element.id
                )));
            }
            let (start, end) = application.span();
            if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
                return Err(SynthesisError::InvariantViolation(format!(
                    "relative range [{start}, {end}] of attribute {} on element {} is not inside [0, 1]",
                    attribute.id, element.id
                )));
            }
            set.deferred.push(DeferredSpan {
                element: element.id,
                start,
                end,
            });
        }

        set.normalize();
        Ok(set)
    }

    pub fn resolve_target(&self, target: &Target, scope: Scope) -> Result<MeshEntitySet> {
        let geometry = &self.model.geometry;
        match target {
            Target::Vertex { vertex } => self.vertex_members(*vertex, scope),
            Target::Curve { curve, owner, .. } => {
                let Some(owner) = owner.or_else(|| geometry.owner_of_curve(*curve)) else {
                    warn!(curve, "curve has no owning macro, resolving to an empty set");
                    return Ok(MeshEntitySet::new());
                };
                Ok(self.collect(
                    self.line_elements_on(&[*curve], owner),
                    Vec::new(),
                    self.edge_links_on(&[*curve], owner),
                    scope,
                ))
            }
            Target::Surface { surface } => {
                let Some(owner) = geometry
                    .macros_by_id()
                    .into_iter()
                    .find(|m| m.surfaces.contains(surface))
                    .map(|m| m.id)
                else {
                    warn!(surface, "surface has no owning macro, resolving to an empty set");
                    return Ok(MeshEntitySet::new());
                };
                let boundary = geometry
                    .surface(*surface)
                    .ok_or_else(|| SynthesisError::not_found(format!("surface {surface}")))?
                    .boundary_curves
                    .clone();
                let mut links = self.edge_links_on(&boundary, owner);
                links.retain(|(element, _)| {
                    self.mesh
                        .element(*element)
                        .is_some_and(|e| e.surface == Some(*surface))
                });
                Ok(self.collect(
                    Vec::new(),
                    self.surface_elements_on(&[*surface], owner),
                    links,
                    scope,
                ))
            }
            Target::Volume { owner } | Target::Macro { owner } => {
                match geometry.macro_by_id(*owner) {
                    Some(owner) => self.macro_members(owner, scope),
                    None => {
                        warn!(owner, "macro does not exist, resolving to an empty set");
                        Ok(MeshEntitySet::new())
                    }
                }
            }
            Target::AllMacros => {
                let mut set = MeshEntitySet::new();
                for owner in geometry.macros_by_id() {
                    set.merge(self.macro_members(owner, scope)?);
                }
                Ok(set)
            }
        }
    }

    fn vertex_members(&self, vertex: u32, scope: Scope) -> Result<MeshEntitySet> {
        if matches!(scope, Scope::Edges | Scope::Surfaces) {
            return Err(SynthesisError::unsupported(format!(
                "vertex target with {scope} scope"
            )));
        }
        let node = self
            .mesh
            .node_on_vertex(vertex)
            .ok_or_else(|| SynthesisError::not_found(format!("mesh node on vertex {vertex}")))?;

        let mut set = MeshEntitySet::new();
        if scope == Scope::Nodes {
            set.nodes.push(node.id);
        } else {
            set.elements.extend(
                self.mesh
                    .elements
                    .iter()
                    .filter(|e| e.kind == ElementKind::Point && e.nodes == [node.id])
                    .map(|e| e.id),
            );
        }
        set.normalize();
        Ok(set)
    }

    fn macro_members(&self, owner: &Macro, scope: Scope) -> Result<MeshEntitySet> {
        macro_kind(owner)?;
        let mut curves: Vec<CurveId> = owner.own_curves().collect();
        curves.extend(self.model.geometry.surface_boundary_curves(owner));
        Ok(self.collect(
            self.line_elements_on(&curves, owner.id),
            self.surface_elements_on(&owner.surfaces, owner.id),
            self.edge_links_on(&curves, owner.id),
            scope,
        ))
    }

    fn line_elements_on(&self, curves: &[CurveId], owner: MacroId) -> Vec<&'a MeshElement> {
        self.mesh
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Line && owned_by(e, owner))
            .filter(|e| e.curve.is_some_and(|c| curves.contains(&c)))
            .collect()
    }

    fn surface_elements_on(&self, surfaces: &[SurfaceId], owner: MacroId) -> Vec<&'a MeshElement> {
        self.mesh
            .elements
            .iter()
            .filter(|e| e.kind.is_surface() && owned_by(e, owner))
            .filter(|e| e.surface.is_some_and(|s| surfaces.contains(&s)))
            .collect()
    }

    fn edge_links_on(&self, curves: &[CurveId], owner: MacroId) -> Vec<(ElementId, u8)> {
        self.mesh
            .edge_links
            .iter()
            .filter(|link| curves.contains(&link.curve))
            .filter(|link| {
                self.mesh
                    .element(link.element)
                    .is_none_or(|e| owned_by(e, owner))
            })
            .map(|link| (link.element, link.rank))
            .collect()
    }

    fn collect(
        &self,
        lines: Vec<&MeshElement>,
        surfaces: Vec<&MeshElement>,
        links: Vec<(ElementId, u8)>,
        scope: Scope,
    ) -> MeshEntitySet {
        let mut set = MeshEntitySet::new();
        match scope {
            Scope::Nodes => {
                set.nodes.extend(
                    lines
                        .iter()
                        .chain(&surfaces)
                        .flat_map(|e| e.nodes.iter().copied()),
                );
                for (element, rank) in &links {
                    if let Some(e) = self.mesh.element(*element)
                        && let Some((i, j)) = e.kind.edge_local_nodes(*rank)
                    {
                        set.nodes.extend(e.nodes.get(i).copied());
                        set.nodes.extend(e.nodes.get(j).copied());
                    }
                }
            }
            Scope::Elements => {
                set.elements
                    .extend(lines.iter().chain(&surfaces).map(|e| e.id));
            }
            Scope::Edges => {
                set.edges.extend(lines.iter().map(|e| (e.id, 1)));
                set.edges.extend(links);
            }
            Scope::Surfaces => {
                set.surfaces
                    .extend(lines.iter().chain(&surfaces).map(|e| (e.id, 1)));
            }
        }
        set.normalize();
        set
    }
}

/// Structural kind of a macro; unknown vendor codes are not supported
pub(crate) fn macro_kind(owner: &Macro) -> Result<MacroKind> {
    owner.kind().ok_or_else(|| {
        SynthesisError::unsupported(format!("macro {} has code '{}'", owner.id, owner.code))
    })
}
