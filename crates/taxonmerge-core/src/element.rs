//! Arena ids and the taxonomic element union.
//!
//! Every node of the graph lives in an arena owned by the
//! [`Taxonomy`](crate::Taxonomy). Links between nodes are ids, so cycles in the
//! source data are just values.
//!
//! ```text
//!   BareName ──► UnrankedScientificName ──► ScientificName ──► TaxonConcept ──► Instance
//!   (no code)     (code, no rank)           (code, rank)       (full key)
//! ```

use serde::Serialize;

macro_rules! arena_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
            pub struct $name(u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }

                pub(crate) fn from_index(index: usize) -> Self {
                    Self(index as u32)
                }
            }
        )*
    };
}

arena_id! {
    /// A taxon concept instance.
    InstanceId,
    /// A taxon concept (full name key).
    ConceptId,
    /// A ranked, coded, authorless name.
    ScientificNameId,
    /// A coded, unranked name.
    UnrankedNameId,
    /// An uncoded name.
    BareNameId,
    ProviderId,
    LocationId,
}

/// Any node a parent or accepted reference can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementRef {
    Instance(InstanceId),
    Concept(ConceptId),
    Scientific(ScientificNameId),
    Unranked(UnrankedNameId),
    Bare(BareNameId),
}

impl ElementRef {
    pub fn as_instance(self) -> Option<InstanceId> {
        match self {
            ElementRef::Instance(id) => Some(id),
            _ => None,
        }
    }
}

impl From<InstanceId> for ElementRef {
    fn from(id: InstanceId) -> Self {
        ElementRef::Instance(id)
    }
}

impl From<ConceptId> for ElementRef {
    fn from(id: ConceptId) -> Self {
        ElementRef::Concept(id)
    }
}

impl From<ScientificNameId> for ElementRef {
    fn from(id: ScientificNameId) -> Self {
        ElementRef::Scientific(id)
    }
}

impl From<UnrankedNameId> for ElementRef {
    fn from(id: UnrankedNameId) -> Self {
        ElementRef::Unranked(id)
    }
}

impl From<BareNameId> for ElementRef {
    fn from(id: BareNameId) -> Self {
        ElementRef::Bare(id)
    }
}
