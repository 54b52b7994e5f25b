//! # taxonmerge-core
//!
//! Merges taxonomic name datasets from several providers into one taxonomy.
//!
//! Records are filed into a name hierarchy, linked to their parents and
//! accepted taxa, repaired where the links loop, and then resolved concept by
//! concept so that every instance maps onto a single representative.
//!
//! ```text
//!   load ──► links ──► loops ──► validate ──► scores ──► concepts (rank by rank)
//!                                                           │
//!   distributions ◄── discards ◄── name principals ◄── unranked reassignment
//! ```
//!
//! The [`Taxonomy`] owns every node in arenas. Parallel phases compute
//! outcomes against `&Taxonomy` with rayon and apply them afterwards.

pub mod concept;
pub mod condition;
pub mod config;
pub mod distribution;
pub mod element;
pub mod error;
pub mod instance;
pub mod messages;
pub mod name;
pub mod provider;
pub mod report;
pub mod resolution;
pub mod resolver;
pub mod score;
pub mod source;
pub mod taxonomy;
pub mod vernacular;

pub use concept::TaxonConcept;
pub use condition::{KeyAdjuster, MatchTaxonCondition, NameMatchType, ScoreAdjuster, TaxonCondition};
pub use config::{ProviderConfig, TaxonomyConfiguration};
pub use distribution::{Distribution, LocationRecord, LocationRegistry};
pub use element::{BareNameId, ConceptId, ElementRef, InstanceId, LocationId, ProviderId, ScientificNameId, UnrankedNameId};
pub use error::{ResolutionError, Result, TaxonomyError};
pub use instance::{DistributionRecord, InstanceRecord, TaxonConceptInstance, VernacularRecord};
pub use name::{BareName, NameLevel, ScientificName, UnrankedScientificName};
pub use provider::{ConceptResolutionPriority, DiscardStrategy, NameProvider, ProviderRegistry, UnrankedStrategy};
pub use report::{Issue, IssueType, Reporter};
pub use resolution::TaxonResolution;
pub use resolver::{AlaResolver, ResolveOutcome, TaxonResolver};
pub use source::TaxonSource;
pub use taxonomy::{OutputDistribution, OutputTaxon, Summary, Taxonomy, IDENTIFIER_DOCUMENT};
pub use vernacular::VernacularName;

/// Lowest possible score. Forbidden instances always get this.
pub const MIN_SCORE: i32 = -1_000_000;

/// Highest possible score. Owned names always get this.
pub const MAX_SCORE: i32 = 1_000_000;

/// Bound on accepted/parent chain chasing before a loop is assumed.
pub const MAX_RESOLUTION_STEPS: usize = 40;

pub const DEFAULT_SCORE: i32 = 100;

pub const DEFAULT_UNKNOWN_TAXON_ID: &str = "ALA_The_Unknown_Taxon";
