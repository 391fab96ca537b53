//! Error types for ofx-synth

use ofx_deck::DeckError;
use ofx_model::ModelError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SynthesisError>;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("ambiguous input: {0}")]
    AmbiguousInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Coarse failure classes, used for exit status and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    NotFound,
    UnsupportedFeature,
    InvariantViolation,
    AmbiguousInput,
    /// Unreadable input, bad configuration, missing header data
    Input,
}

impl SynthesisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SynthesisError::NotFound(_) => ErrorCategory::NotFound,
            SynthesisError::UnsupportedFeature(_) => ErrorCategory::UnsupportedFeature,
            SynthesisError::InvariantViolation(_) => ErrorCategory::InvariantViolation,
            SynthesisError::AmbiguousInput(_) => ErrorCategory::AmbiguousInput,
            SynthesisError::Config(_) => ErrorCategory::Input,
            SynthesisError::Model(ModelError::NotFound(_)) => ErrorCategory::NotFound,
            SynthesisError::Model(ModelError::Invalid(_)) => ErrorCategory::InvariantViolation,
            SynthesisError::Model(_) => ErrorCategory::Input,
            SynthesisError::Deck(err) if err.is_invariant_violation() => {
                ErrorCategory::InvariantViolation
            }
            SynthesisError::Deck(_) => ErrorCategory::Input,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        SynthesisError::NotFound(what.into())
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        SynthesisError::UnsupportedFeature(what.into())
    }
}
