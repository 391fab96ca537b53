//! Error types for ofx-deck

use ofx_model::ElementKind;
use thiserror::Error;

use crate::records::IdSpace;

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("duplicate {space} id {id}")]
    DuplicateId { space: IdSpace, id: u32 },

    #[error("id 0 is reserved in the {space} space")]
    ReservedId { space: IdSpace },

    #[error("{space} {id} does not exist")]
    MissingRecord { space: IdSpace, id: u32 },

    #[error("{boundary} rank {rank} is invalid for {kind} element {element}")]
    InvalidRank {
        element: u32,
        kind: ElementKind,
        boundary: &'static str,
        rank: u8,
    },

    #[error("{kind} element {element} has {actual} nodes but expected {expected}")]
    NodeCount {
        element: u32,
        kind: ElementKind,
        expected: usize,
        actual: usize,
    },

    #[error("element {element} does not reference node {node}")]
    NodeNotInElement { element: u32, node: u32 },

    #[error("missing header metadata: {0}")]
    MissingHeader(&'static str),

    #[error("{0} starts with '#' and would be read as a comment")]
    CommentHeader(&'static str),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeckError {
    /// Everything except header, parse and I/O failures breaks a registry
    /// invariant.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(
            self,
            DeckError::MissingHeader(_)
                | DeckError::CommentHeader(_)
                | DeckError::Parse { .. }
                | DeckError::Io(_)
        )
    }
}
