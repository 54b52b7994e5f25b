//! Small closed vocabularies: nomenclatural codes, name types, flags and
//! distribution/vernacular terms.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn unknown(kind: &'static str, term: &str) -> ModelError {
    ModelError::UnknownTerm {
        kind,
        term: term.to_string(),
    }
}

// ============================================================================
// Nomenclatural codes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomenclaturalCode {
    Bacterial,
    Botanical,
    Cultivars,
    Virus,
    Zoological,
}

impl NomenclaturalCode {
    pub const ALL: &'static [NomenclaturalCode] = &[
        NomenclaturalCode::Bacterial,
        NomenclaturalCode::Botanical,
        NomenclaturalCode::Cultivars,
        NomenclaturalCode::Virus,
        NomenclaturalCode::Zoological,
    ];

    pub fn acronym(self) -> &'static str {
        match self {
            NomenclaturalCode::Bacterial => "ICNP",
            NomenclaturalCode::Botanical => "ICN",
            NomenclaturalCode::Cultivars => "ICNCP",
            NomenclaturalCode::Virus => "ICTV",
            NomenclaturalCode::Zoological => "ICZN",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            NomenclaturalCode::Bacterial => &["bacterial", "icnb", "bc", "icsp"],
            NomenclaturalCode::Botanical => &["botanical", "icbn", "icnafp", "bot"],
            NomenclaturalCode::Cultivars => &["cultivars", "cultivar"],
            NomenclaturalCode::Virus => &["virus", "viral", "icvcn"],
            NomenclaturalCode::Zoological => &["zoological", "zoo"],
        }
    }
}

impl fmt::Display for NomenclaturalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.acronym())
    }
}

impl FromStr for NomenclaturalCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        NomenclaturalCode::ALL
            .iter()
            .copied()
            .find(|c| c.acronym().to_lowercase() == wanted || c.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| unknown("nomenclatural code", s))
    }
}

// ============================================================================
// Name types and flags
// ============================================================================

/// What kind of name string a key was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameType {
    Scientific,
    Virus,
    Hybrid,
    Informal,
    Cultivar,
    Candidatus,
    Doubtful,
    Placeholder,
    NoName,
}

impl NameType {
    pub fn label(self) -> &'static str {
        match self {
            NameType::Scientific => "SCIENTIFIC",
            NameType::Virus => "VIRUS",
            NameType::Hybrid => "HYBRID",
            NameType::Informal => "INFORMAL",
            NameType::Cultivar => "CULTIVAR",
            NameType::Candidatus => "CANDIDATUS",
            NameType::Doubtful => "DOUBTFUL",
            NameType::Placeholder => "PLACEHOLDER",
            NameType::NoName => "NO_NAME",
        }
    }

    /// Names that follow a nomenclatural code's formation rules.
    pub fn is_formal(self) -> bool {
        matches!(
            self,
            NameType::Scientific | NameType::Hybrid | NameType::Cultivar | NameType::Virus
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonFlag {
    /// Name repeats the species epithet below species rank (`Acacia dealbata dealbata`).
    Autonym,
    /// Record added to patch structure rather than supplied as data.
    Synthetic,
    AmbiguousNomenclaturalCode,
}

impl FromStr for TaxonFlag {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "").as_str() {
            "autonym" => Ok(TaxonFlag::Autonym),
            "synthetic" => Ok(TaxonFlag::Synthetic),
            "ambiguousnomenclaturalcode" => Ok(TaxonFlag::AmbiguousNomenclaturalCode),
            _ => Err(unknown("taxon flag", s)),
        }
    }
}

// ============================================================================
// Distribution and vernacular terms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccurrenceStatus {
    Present,
    Common,
    Rare,
    Irregular,
    Doubtful,
    Excluded,
    Absent,
}

impl FromStr for OccurrenceStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(OccurrenceStatus::Present),
            "common" => Ok(OccurrenceStatus::Common),
            "rare" => Ok(OccurrenceStatus::Rare),
            "irregular" => Ok(OccurrenceStatus::Irregular),
            "doubtful" => Ok(OccurrenceStatus::Doubtful),
            "excluded" => Ok(OccurrenceStatus::Excluded),
            "absent" => Ok(OccurrenceStatus::Absent),
            _ => Err(unknown("occurrence status", s)),
        }
    }
}

/// Standing of a vernacular name. Variants are ordered from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VernacularStatus {
    Preferred,
    Common,
    Local,
    Misapplied,
}

impl VernacularStatus {
    /// Ranking weight; larger wins.
    pub fn weight(self) -> i32 {
        match self {
            VernacularStatus::Preferred => 300,
            VernacularStatus::Common => 200,
            VernacularStatus::Local => 100,
            VernacularStatus::Misapplied => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_parse_from_acronyms_and_names() {
        assert_eq!("ICZN".parse::<NomenclaturalCode>().unwrap(), NomenclaturalCode::Zoological);
        assert_eq!("icbn".parse::<NomenclaturalCode>().unwrap(), NomenclaturalCode::Botanical);
        assert_eq!("Virus".parse::<NomenclaturalCode>().unwrap(), NomenclaturalCode::Virus);
        assert!("ICXX".parse::<NomenclaturalCode>().is_err());
    }

    #[test]
    fn formal_name_types() {
        assert!(NameType::Scientific.is_formal());
        assert!(!NameType::Placeholder.is_formal());
        assert!(!NameType::Informal.is_formal());
    }
}
