//! Taxonomic status.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse grouping of taxonomic status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomicTypeGroup {
    Accepted,
    Synonym,
    Misapplied,
    Excluded,
    IncertaeSedis,
    Unplaced,
    Invalid,
    Doubtful,
    Miscellaneous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomicType {
    Accepted,
    InferredAccepted,
    Synonym,
    HomotypicSynonym,
    ObjectiveSynonym,
    HeterotypicSynonym,
    SubjectiveSynonym,
    ProParteSynonym,
    Misapplied,
    InferredSynonym,
    Excluded,
    InferredExcluded,
    IncertaeSedis,
    SpeciesInquirenda,
    Unplaced,
    InferredUnplaced,
    Invalid,
    InferredInvalid,
    Doubtful,
    MiscellaneousLiterature,
}

struct Traits {
    term: &'static str,
    group: TaxonomicTypeGroup,
    primary: bool,
    accepted: bool,
    synonym: bool,
    placeholder: bool,
    labels: &'static [&'static str],
}

const fn traits(
    term: &'static str,
    group: TaxonomicTypeGroup,
    primary: bool,
    accepted: bool,
    synonym: bool,
    placeholder: bool,
    labels: &'static [&'static str],
) -> Traits {
    Traits {
        term,
        group,
        primary,
        accepted,
        synonym,
        placeholder,
        labels,
    }
}

impl TaxonomicType {
    pub const ALL: &'static [TaxonomicType] = &[
        TaxonomicType::Accepted,
        TaxonomicType::InferredAccepted,
        TaxonomicType::Synonym,
        TaxonomicType::HomotypicSynonym,
        TaxonomicType::ObjectiveSynonym,
        TaxonomicType::HeterotypicSynonym,
        TaxonomicType::SubjectiveSynonym,
        TaxonomicType::ProParteSynonym,
        TaxonomicType::Misapplied,
        TaxonomicType::InferredSynonym,
        TaxonomicType::Excluded,
        TaxonomicType::InferredExcluded,
        TaxonomicType::IncertaeSedis,
        TaxonomicType::SpeciesInquirenda,
        TaxonomicType::Unplaced,
        TaxonomicType::InferredUnplaced,
        TaxonomicType::Invalid,
        TaxonomicType::InferredInvalid,
        TaxonomicType::Doubtful,
        TaxonomicType::MiscellaneousLiterature,
    ];

    /// The synonym statuses, used by unranked strategies.
    pub const SYNONYMS: &'static [TaxonomicType] = &[
        TaxonomicType::Synonym,
        TaxonomicType::HomotypicSynonym,
        TaxonomicType::ObjectiveSynonym,
        TaxonomicType::HeterotypicSynonym,
        TaxonomicType::SubjectiveSynonym,
        TaxonomicType::ProParteSynonym,
        TaxonomicType::InferredSynonym,
    ];

    fn traits(self) -> Traits {
        use TaxonomicTypeGroup as G;
        match self {
            TaxonomicType::Accepted => traits("accepted", G::Accepted, true, true, false, false, &["valid"]),
            TaxonomicType::InferredAccepted => traits("inferredAccepted", G::Accepted, true, true, false, false, &[]),
            TaxonomicType::Synonym => traits("synonym", G::Synonym, true, false, true, false, &["invalid synonym"]),
            TaxonomicType::HomotypicSynonym => traits("homotypicSynonym", G::Synonym, true, false, true, false, &["nomenclatural synonym"]),
            TaxonomicType::ObjectiveSynonym => traits("objectiveSynonym", G::Synonym, true, false, true, false, &[]),
            TaxonomicType::HeterotypicSynonym => traits("heterotypicSynonym", G::Synonym, true, false, true, false, &["taxonomic synonym"]),
            TaxonomicType::SubjectiveSynonym => traits("subjectiveSynonym", G::Synonym, true, false, true, false, &[]),
            TaxonomicType::ProParteSynonym => traits("proParteSynonym", G::Synonym, true, false, true, false, &["pro parte synonym"]),
            TaxonomicType::Misapplied => traits("misapplied", G::Misapplied, false, false, true, false, &["misapplied name"]),
            TaxonomicType::InferredSynonym => traits("inferredSynonym", G::Synonym, true, false, true, false, &[]),
            TaxonomicType::Excluded => traits("excluded", G::Excluded, false, false, false, false, &[]),
            TaxonomicType::InferredExcluded => traits("inferredExcluded", G::Excluded, false, false, false, false, &[]),
            TaxonomicType::IncertaeSedis => traits("incertaeSedis", G::IncertaeSedis, false, true, false, true, &["incertae sedis"]),
            TaxonomicType::SpeciesInquirenda => traits("speciesInquirenda", G::IncertaeSedis, false, true, false, true, &["species inquirenda"]),
            TaxonomicType::Unplaced => traits("unplaced", G::Unplaced, false, false, false, false, &["unknown"]),
            TaxonomicType::InferredUnplaced => traits("inferredUnplaced", G::Unplaced, false, false, false, false, &[]),
            TaxonomicType::Invalid => traits("invalid", G::Invalid, false, false, false, false, &[]),
            TaxonomicType::InferredInvalid => traits("inferredInvalid", G::Invalid, false, false, false, false, &[]),
            TaxonomicType::Doubtful => traits("doubtful", G::Doubtful, false, false, false, false, &[]),
            TaxonomicType::MiscellaneousLiterature => traits("miscellaneousLiterature", G::Miscellaneous, false, false, false, false, &[]),
        }
    }

    /// Darwin Core style term, e.g. `homotypicSynonym`.
    pub fn term(self) -> &'static str {
        self.traits().term
    }

    pub fn group(self) -> TaxonomicTypeGroup {
        self.traits().group
    }

    pub fn is_primary(self) -> bool {
        self.traits().primary
    }

    pub fn is_accepted(self) -> bool {
        self.traits().accepted
    }

    pub fn is_synonym(self) -> bool {
        self.traits().synonym
    }

    pub fn is_placeholder(self) -> bool {
        self.traits().placeholder
    }

    pub fn is_unplaced(self) -> bool {
        self.group() == TaxonomicTypeGroup::Unplaced
    }

    /// Excluded-from-region statuses that override rather than compete.
    pub fn is_geographic(self) -> bool {
        self.group() == TaxonomicTypeGroup::Excluded
    }

    pub fn is_output(self) -> bool {
        self != TaxonomicType::MiscellaneousLiterature
    }
}

impl fmt::Display for TaxonomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.term())
    }
}

impl FromStr for TaxonomicType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        let squashed: String = wanted.chars().filter(|c| c.is_alphanumeric()).collect();
        TaxonomicType::ALL
            .iter()
            .copied()
            .find(|t| {
                let traits = t.traits();
                traits.term.to_lowercase() == squashed
                    || traits.labels.iter().any(|l| *l == wanted)
            })
            .ok_or_else(|| ModelError::UnknownTerm {
                kind: "taxonomic status",
                term: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_traits() {
        assert!(TaxonomicType::Accepted.is_primary());
        assert!(TaxonomicType::HomotypicSynonym.is_synonym());
        assert!(!TaxonomicType::Misapplied.is_primary());
        assert!(TaxonomicType::InferredUnplaced.is_unplaced());
        assert!(TaxonomicType::IncertaeSedis.is_placeholder());
        assert!(TaxonomicType::Excluded.is_geographic());
        assert!(!TaxonomicType::MiscellaneousLiterature.is_output());
    }

    #[test]
    fn parses_terms_and_labels() {
        assert_eq!("accepted".parse::<TaxonomicType>().unwrap(), TaxonomicType::Accepted);
        assert_eq!(
            "heterotypic synonym".parse::<TaxonomicType>().unwrap(),
            TaxonomicType::HeterotypicSynonym
        );
        assert_eq!(
            "misapplied name".parse::<TaxonomicType>().unwrap(),
            TaxonomicType::Misapplied
        );
        assert!("whatever".parse::<TaxonomicType>().is_err());
    }
}
