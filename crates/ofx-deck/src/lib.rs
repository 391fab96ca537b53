//! Solver-facing side of the OOFEM deck synthesizer.
//!
//! - [`records`]: node, element, material, cross-section, boundary-condition,
//!   time-function and set records referencing each other by id
//! - [`registry`]: the id-indexed store with per-space allocation and the
//!   permitted edits
//! - [`emitter`] / [`writer`]: text rendering and atomic file output
//! - [`reader`]: re-parses decks and checks their references

pub mod emitter;
pub mod error;
pub mod reader;
pub mod records;
pub mod registry;
pub mod writer;

pub use emitter::{DeckHeader, DomainType, ExportModule, emit_deck, format_real, render_deck};
pub use error::{DeckError, Result};
pub use reader::{ComponentCounts, ParsedDeck, Record};
pub use records::{
    BoundaryConditionRecord, CrossSectionRecord, ElementRecord, ElementRole, IdSpace,
    MaterialRecord, Membership, NodeRecord, NodeRole, SectionRole, SetRecord, TimeFunctionRecord,
    TimeFunctionShape,
};
pub use registry::{FinalDeck, RecordRegistry};
pub use writer::{write_deck, write_rendered};
