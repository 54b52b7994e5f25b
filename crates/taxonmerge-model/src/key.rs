//! Name keys.
//!
//! A [`NameKey`] is the identity of a name: `(code, name, author, rank)` plus
//! the name type and flags that came out of analysis. Equality uses the
//! canonical author form computed by an [`AuthorComparator`] when the key was
//! built, so keys stay plain values that can sit in hash maps.
//!
//! Hashing covers the code, the name and whether an author is present. Rank
//! and the author text itself are left to equality.

use crate::author::AuthorComparator;
use crate::rank::Rank;
use crate::vocab::{NameType, NomenclaturalCode, TaxonFlag};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Serialize)]
pub struct NameKey {
    code: Option<NomenclaturalCode>,
    name: String,
    author: Option<String>,
    #[serde(skip)]
    canonical_author: Option<String>,
    rank: Rank,
    name_type: NameType,
    flags: BTreeSet<TaxonFlag>,
}

impl NameKey {
    pub fn new(
        comparator: &AuthorComparator,
        code: Option<NomenclaturalCode>,
        name: impl Into<String>,
        author: Option<String>,
        rank: Rank,
        name_type: NameType,
        flags: BTreeSet<TaxonFlag>,
    ) -> Self {
        let author = author.filter(|a| !a.trim().is_empty());
        let canonical_author = author.as_deref().map(|a| comparator.canonical(a));
        Self {
            code,
            name: name.into(),
            author,
            canonical_author,
            rank,
            name_type,
            flags,
        }
    }

    pub fn code(&self) -> Option<NomenclaturalCode> {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }

    pub fn flags(&self) -> &BTreeSet<TaxonFlag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: TaxonFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_autonym(&self) -> bool {
        self.has_flag(TaxonFlag::Autonym)
    }

    pub fn is_unauthored(&self) -> bool {
        self.author.is_none()
    }

    pub fn is_uncoded(&self) -> bool {
        self.code.is_none()
    }

    pub fn is_unranked(&self) -> bool {
        self.rank == Rank::Unranked
    }

    /// Coded and of a name type governed by a code.
    pub fn is_formal(&self) -> bool {
        self.code.is_some() && self.name_type.is_formal()
    }

    /// Compare an author against this key's author, absent authors first.
    pub fn compare_author(&self, comparator: &AuthorComparator, author: Option<&str>) -> Ordering {
        comparator.compare(self.author(), author)
    }

    fn stripped_flags(&self) -> BTreeSet<TaxonFlag> {
        let mut flags = self.flags.clone();
        flags.remove(&TaxonFlag::Autonym);
        flags
    }

    /// The scientific-name key: same code and rank, no author.
    pub fn to_name_key(&self) -> NameKey {
        if self.author.is_none() {
            return self.clone();
        }
        NameKey {
            author: None,
            canonical_author: None,
            flags: self.stripped_flags(),
            ..self.clone()
        }
    }

    /// The unranked-name key: same code, rank `UNRANKED`, no author.
    pub fn to_unranked_name_key(&self) -> NameKey {
        if self.author.is_none() && self.rank == Rank::Unranked {
            return self.clone();
        }
        NameKey {
            author: None,
            canonical_author: None,
            rank: Rank::Unranked,
            flags: self.stripped_flags(),
            ..self.clone()
        }
    }

    /// The bare-name key: no code, rank `UNRANKED`, no author.
    pub fn to_uncoded_name_key(&self) -> NameKey {
        if self.author.is_none() && self.rank == Rank::Unranked && self.code.is_none() {
            return self.clone();
        }
        NameKey {
            code: None,
            author: None,
            canonical_author: None,
            rank: Rank::Unranked,
            flags: self.stripped_flags(),
            ..self.clone()
        }
    }

    /// The same key at a different rank.
    pub fn to_ranked_name_key(&self, rank: Rank) -> NameKey {
        NameKey {
            rank,
            ..self.clone()
        }
    }

    /// Replace selected parts of the key. Used by provider key adjustments.
    #[allow(clippy::too_many_arguments)]
    pub fn adjusted(
        &self,
        comparator: &AuthorComparator,
        code: Option<NomenclaturalCode>,
        name: Option<&str>,
        author: Option<Option<&str>>,
        name_type: Option<NameType>,
        rank: Option<Rank>,
    ) -> NameKey {
        let author = match author {
            Some(a) => a.map(str::to_string),
            None => self.author.clone(),
        };
        NameKey::new(
            comparator,
            code.or(self.code),
            name.map(str::to_string).unwrap_or_else(|| self.name.clone()),
            author,
            rank.unwrap_or(self.rank),
            name_type.unwrap_or(self.name_type),
            self.flags.clone(),
        )
    }
}

impl PartialEq for NameKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NameKey {}

impl Hash for NameKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.name.hash(state);
        self.author.is_some().hash(state);
    }
}

impl PartialOrd for NameKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NameKey {
    /// Code (absent first), name, rank, then canonical author (absent first).
    fn cmp(&self, other: &Self) -> Ordering {
        self.code
            .cmp(&other.code)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.rank.cmp(&other.rank))
            .then_with(|| self.canonical_author.cmp(&other.canonical_author))
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}",
            self.code.map(|c| c.acronym()).unwrap_or(""),
            self.name
        )?;
        if let Some(author) = &self.author {
            write!(f, ",{}", author)?;
        }
        write!(f, ":{}", self.rank)?;
        if !self.flags.is_empty() {
            write!(f, ":{:?}", self.flags)?;
        }
        f.write_str("]")
    }
}
