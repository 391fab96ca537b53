//! Synthesis of OOFEM input decks from annotated structural models.
//!
//! The pipeline walks an [`ofx_model::Model`], resolves every attribute's
//! geometric targets to mesh members ([`resolver`]), fills an
//! [`ofx_deck::RecordRegistry`] ([`population`]), adds the records the solver
//! needs but the model does not declare ([`passes`]), splits line elements
//! under partial loads ([`refinement`]) and renders the finished deck.
//!
//! ```no_run
//! use ofx_synth::{SynthesisConfig, Synthesizer};
//!
//! let model = ofx_model::load_model("frame.json")?;
//! let synthesis = Synthesizer::new(SynthesisConfig::default()).synthesize(&model)?;
//! synthesis.write("frame.in")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod passes;
pub mod pipeline;
pub mod population;
pub mod refinement;
pub mod resolver;

pub use config::{ElementTypeNames, RecordTemplate, SubsoilTypeNames, SynthesisConfig};
pub use context::{SynthesisContext, SynthesisReport};
pub use error::{ErrorCategory, Result, SynthesisError};
pub use pipeline::{Synthesis, Synthesizer, domain_type, synthesize};
pub use refinement::{ElementRefinementEngine, SplitOutcome, SplitPiece};
pub use resolver::{AttributeSetResolver, DeferredSpan, MeshEntitySet};
