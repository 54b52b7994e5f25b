//! Error types for the resolution engine.

use taxonmerge_model::ModelError;
use taxonmerge_storage::StorageError;
use thiserror::Error;

/// Failures that abort a taxonomy build.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unable to find unknown taxon identifier for provider {0}")]
    NoUnknownTaxon(String),

    #[error("taxon id {0} already in use")]
    DuplicateTaxonId(String),

    #[error("unknown taxon id: {0}")]
    UnknownTaxon(String),

    #[error("unrecognised location {0}")]
    UnknownLocation(String),

    #[error("unable to reallocate {element} to {target} without representative and resolution")]
    Reallocation { element: String, target: String },

    #[error("expecting unranked taxon concept {0}")]
    NotUnranked(String),

    #[error("errors resolving links")]
    Links,

    #[error("invalid source data")]
    InvalidSourceData,

    #[error("invalid resolution")]
    InvalidResolution,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;

/// Raised while chasing accepted/parent chains during a query.
///
/// The trace lists the taxon ids visited before the chase gave up. Callers
/// usually catch this and substitute the unknown taxon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("detected possible loop resolving {kind} for {taxon_id}")]
    Loop {
        kind: &'static str,
        taxon_id: String,
        trace: Vec<String>,
    },

    #[error("detected dangling resolution resolving accepted for {taxon_id}")]
    Dangling { taxon_id: String, trace: Vec<String> },
}

impl ResolutionError {
    pub fn taxon_id(&self) -> &str {
        match self {
            ResolutionError::Loop { taxon_id, .. } | ResolutionError::Dangling { taxon_id, .. } => {
                taxon_id
            }
        }
    }

    pub fn trace(&self) -> &[String] {
        match self {
            ResolutionError::Loop { trace, .. } | ResolutionError::Dangling { trace, .. } => trace,
        }
    }
}
