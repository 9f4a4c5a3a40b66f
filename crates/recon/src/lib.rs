//! `idrecon`: identity resolution and cost-center consolidation engine.
//!
//! Pure engine crate: receives text units and reference rows through the
//! [`source`] traits, returns resolved outcomes, consolidated rows and a
//! report. No CLI or file-format dependencies.

pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod reference;
pub mod report;
pub mod resolve;
pub mod similarity;
pub mod source;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{
    Candidate, CandidateKind, ConsolidatedRow, MatchMethod, MatchOutcome, MatchStatus,
    ReferenceRow, RunOutput, RunReport, TextUnit,
};
pub use source::{ReferenceSource, TextSource};
