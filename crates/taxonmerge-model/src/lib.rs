//! Taxonomic vocabulary and name identity.
//!
//! Everything in this crate is plain data: ranks, taxonomic status, nomenclatural
//! codes and the [`NameKey`] that decides whether two records talk about the same
//! name. The resolution engine in `taxonmerge-core` builds on these types.
//!
//! ```text
//!   raw record ──► NameAnalyser ──► NameKey ──┬─► to_uncoded_name_key()   (bare name)
//!                                             ├─► to_unranked_name_key()  (unranked name)
//!                                             ├─► to_name_key()           (scientific name)
//!                                             └─► (itself)                (taxon concept)
//! ```

pub mod analyser;
pub mod author;
pub mod key;
pub mod rank;
pub mod status;
pub mod vocab;

pub use analyser::{AnalysisResult, BasicNameAnalyser, NameAnalyser, NameInput};
pub use author::AuthorComparator;
pub use key::NameKey;
pub use rank::Rank;
pub use status::{TaxonomicType, TaxonomicTypeGroup};
pub use vocab::{NameType, NomenclaturalCode, OccurrenceStatus, TaxonFlag, VernacularStatus};

use thiserror::Error;

/// Errors raised while mapping verbatim terms onto the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown {kind} term: {term:?}")]
    UnknownTerm { kind: &'static str, term: String },

    #[error("invalid name pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
