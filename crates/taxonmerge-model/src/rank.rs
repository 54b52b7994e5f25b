//! Taxonomic ranks.
//!
//! Each rank has a numeric id that grows towards the leaves of the tree
//! (kingdom 1000, genus 6000, species 7000). Loose ranks (`UNRANKED`,
//! `INFORMAL` and a few others) carry non-positive ids and sort after every
//! real rank.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const LOOSE_SORT_ORDER: i32 = 10_000;

macro_rules! ranks {
    ($($variant:ident => ($id:expr, $label:expr $(, $alias:expr)*)),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum Rank {
            $($variant),*
        }

        impl Rank {
            pub const ALL: &'static [Rank] = &[$(Rank::$variant),*];

            /// Numeric rank id. Larger is closer to the leaves, non-positive is loose.
            pub const fn id(self) -> i32 {
                match self {
                    $(Rank::$variant => $id),*
                }
            }

            /// Canonical lower-case label.
            pub const fn label(self) -> &'static str {
                match self {
                    $(Rank::$variant => $label),*
                }
            }

            fn aliases(self) -> &'static [&'static str] {
                match self {
                    $(Rank::$variant => &[$($alias),*]),*
                }
            }
        }
    };
}

ranks! {
    Domain => (800, "domain"),
    Kingdom => (1000, "kingdom", "regnum"),
    Subkingdom => (1200, "subkingdom"),
    Superphylum => (1800, "superphylum"),
    Phylum => (2000, "phylum", "division botany", "division"),
    Subphylum => (2200, "subphylum", "subdivision botany"),
    Superclass => (2800, "superclass"),
    Class => (3000, "class"),
    Subclass => (3200, "subclass"),
    Infraclass => (3350, "infraclass"),
    Superorder => (3800, "superorder"),
    Order => (4000, "order"),
    Suborder => (4200, "suborder"),
    Infraorder => (4350, "infraorder"),
    Parvorder => (4400, "parvorder"),
    Superfamily => (4500, "superfamily"),
    Family => (5000, "family"),
    Subfamily => (5500, "subfamily"),
    Tribe => (5600, "tribe"),
    Subtribe => (5700, "subtribe"),
    Genus => (6000, "genus"),
    Subgenus => (6500, "subgenus"),
    SectionBotany => (6600, "section botany", "section"),
    SubsectionBotany => (6700, "subsection botany", "subsection"),
    SeriesBotany => (6800, "series botany", "series"),
    SpeciesGroup => (6950, "species group", "aggregate species"),
    Species => (7000, "species", "sp", "sp."),
    Subspecies => (8000, "subspecies", "subsp", "subsp.", "ssp", "ssp."),
    Infraspecificname => (8005, "infraspecificname", "infraspecies"),
    Variety => (8010, "variety", "var", "var."),
    Subvariety => (8015, "subvariety", "subvar."),
    Form => (8020, "form", "forma", "f."),
    Subform => (8025, "subform"),
    Cultivar => (8050, "cultivar", "cv."),
    Informal => (-1, "informal"),
    Unranked => (0, "unranked", "no rank"),
}

impl Rank {
    pub fn is_loose(self) -> bool {
        self.id() <= 0
    }

    /// Sort order used to process ranks from the root down. Loose ranks go last.
    pub fn sort_order(self) -> i32 {
        if self.is_loose() {
            LOOSE_SORT_ORDER
        } else {
            self.id()
        }
    }

    /// True when `self` sits strictly closer to the root than `other`.
    pub fn is_higher_than(self, other: Rank) -> bool {
        self.sort_order() < other.sort_order()
    }

    pub fn for_id(id: i32) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| r.id() == id)
    }

    /// Ordered classification ranks paired with their Darwin Core term names.
    pub const CLASSIFICATION: &'static [(Rank, &'static str)] = &[
        (Rank::Kingdom, "kingdom"),
        (Rank::Phylum, "phylum"),
        (Rank::Class, "class"),
        (Rank::Order, "order"),
        (Rank::Family, "family"),
        (Rank::Genus, "genus"),
        (Rank::Species, "specificEpithet"),
    ];
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rank {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', " ");
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.label() == wanted || r.aliases().iter().any(|a| *a == wanted))
            .ok_or_else(|| ModelError::UnknownTerm {
                kind: "rank",
                term: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_ranks_sort_last() {
        assert!(Rank::Kingdom.is_higher_than(Rank::Genus));
        assert!(Rank::Cultivar.is_higher_than(Rank::Unranked));
        assert!(!Rank::Unranked.is_higher_than(Rank::Phylum));
        assert!(!Rank::Informal.is_higher_than(Rank::Unranked));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("subsp.".parse::<Rank>().unwrap(), Rank::Subspecies);
        assert_eq!("SECTION_BOTANY".parse::<Rank>().unwrap(), Rank::SectionBotany);
        assert!("nonsense".parse::<Rank>().is_err());
    }
}
