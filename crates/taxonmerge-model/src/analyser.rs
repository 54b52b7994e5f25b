//! Name analysis: turning a verbatim name into a [`NameKey`].
//!
//! Full scientific-name parsing is out of scope. [`BasicNameAnalyser`] is a
//! small regex normaliser that is good enough to group identical names,
//! classify obvious placeholders, hybrids and cultivars, and pull out
//! genus/epithet hints for loosely structured sources.

use crate::author::AuthorComparator;
use crate::key::NameKey;
use crate::rank::Rank;
use crate::status::TaxonomicType;
use crate::vocab::{NameType, NomenclaturalCode, TaxonFlag};
use crate::{ModelError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Verbatim name information handed to an analyser.
#[derive(Debug, Clone, Default)]
pub struct NameInput<'a> {
    pub code: Option<NomenclaturalCode>,
    pub name: &'a str,
    pub author: Option<&'a str>,
    pub rank: Option<Rank>,
    pub status: Option<TaxonomicType>,
    pub flags: BTreeSet<TaxonFlag>,
    /// Loose sources may embed the author in the name.
    pub loose: bool,
}

impl<'a> NameInput<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn code(mut self, code: Option<NomenclaturalCode>) -> Self {
        self.code = code;
        self
    }

    pub fn author(mut self, author: Option<&'a str>) -> Self {
        self.author = author;
        self
    }

    pub fn rank(mut self, rank: Option<Rank>) -> Self {
        self.rank = rank;
        self
    }

    pub fn status(mut self, status: Option<TaxonomicType>) -> Self {
        self.status = status;
        self
    }

    pub fn flags(mut self, flags: BTreeSet<TaxonFlag>) -> Self {
        self.flags = flags;
        self
    }

    pub fn loose(mut self, loose: bool) -> Self {
        self.loose = loose;
        self
    }
}

/// The analysed key plus the name parts a loose source can use as
/// classification hints.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub key: NameKey,
    pub mononomial: Option<String>,
    pub genus: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    pub cultivar_epithet: Option<String>,
}

pub trait NameAnalyser: Send + Sync {
    fn analyse(&self, input: &NameInput<'_>) -> AnalysisResult;

    fn author_comparator(&self) -> &AuthorComparator;

    /// Does the (verbatim) name look like an informal name?
    fn is_informal(&self, name: &str) -> bool;

    /// Guess a rank from the shape of a name.
    fn infer_rank(&self, name: &str, hint: Option<Rank>) -> Option<Rank>;

    /// Shortcut for lookups by code, name, author and rank.
    fn key(
        &self,
        code: Option<NomenclaturalCode>,
        name: &str,
        author: Option<&str>,
        rank: Option<Rank>,
    ) -> NameKey {
        self.analyse(&NameInput::new(name).code(code).author(author).rank(rank))
            .key
    }

    fn canonicalise_code(&self, code: &str) -> Result<NomenclaturalCode> {
        code.parse()
    }

    /// Blank ranks are unranked.
    fn canonicalise_rank(&self, rank: &str) -> Result<Rank> {
        if rank.trim().is_empty() {
            return Ok(Rank::Unranked);
        }
        rank.parse()
    }

    /// Blank statuses are inferred unplaced.
    fn canonicalise_taxonomic_type(&self, status: &str) -> Result<TaxonomicType> {
        if status.trim().is_empty() {
            return Ok(TaxonomicType::InferredUnplaced);
        }
        status.parse()
    }

    fn canonicalise_flag(&self, flag: &str) -> Result<TaxonFlag> {
        flag.parse()
    }
}

const RANK_MARKERS: &[(&str, Rank)] = &[
    ("subsp", Rank::Subspecies),
    ("ssp", Rank::Subspecies),
    ("var", Rank::Variety),
    ("subvar", Rank::Subvariety),
    ("forma", Rank::Form),
    ("f", Rank::Form),
    ("subf", Rank::Subform),
    ("cv", Rank::Cultivar),
    ("sect", Rank::SectionBotany),
    ("subsect", Rank::SubsectionBotany),
    ("ser", Rank::SeriesBotany),
    ("subg", Rank::Subgenus),
    ("agg", Rank::SpeciesGroup),
    ("sp", Rank::Species),
    ("spp", Rank::Species),
];

const SUFFIX_RANKS: &[(&str, Rank)] = &[
    ("oideae", Rank::Subfamily),
    ("aceae", Rank::Family),
    ("idae", Rank::Family),
    ("inae", Rank::Subfamily),
    ("ales", Rank::Order),
    ("phyta", Rank::Phylum),
    ("mycota", Rank::Phylum),
    ("opsida", Rank::Class),
    ("mycetes", Rank::Class),
    ("phyceae", Rank::Class),
    ("eae", Rank::Tribe),
    ("ini", Rank::Tribe),
];

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ModelError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct BasicNameAnalyser {
    comparator: AuthorComparator,
    escapes: Regex,
    bracketed: Regex,
    author_and: Regex,
    spaces: Regex,
    year_marker: Regex,
    unsure_marker: Regex,
    parenthesis: Regex,
    loose_markers: Regex,
    placeholder: Regex,
    cultivar: Regex,
    invalid: Regex,
    doubtful: Regex,
    higher_scientific: Regex,
    lower_scientific: Regex,
    non_name: Regex,
    informal: Vec<Regex>,
}

impl BasicNameAnalyser {
    pub fn new() -> Result<Self> {
        Self::with_author_comparator(AuthorComparator::default())
    }

    pub fn with_author_comparator(comparator: AuthorComparator) -> Result<Self> {
        let markers = RANK_MARKERS
            .iter()
            .map(|(m, _)| *m)
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            comparator,
            escapes: compile(r"\\(.)")?,
            bracketed: compile(r"\s(\[.+\]|\{.+\})")?,
            author_and: compile(r"\s+and\s+")?,
            spaces: compile(r"\s+")?,
            year_marker: compile(r"^\s*,\s*\d{4}(?:$|\s)")?,
            unsure_marker: compile(r"\s+(?:cf|cfr|conf|aff)\.?\s+")?,
            parenthesis: compile(r"\s\(\s*\p{Alphabetic}+\s*\)\s")?,
            loose_markers: compile(&format!(r"\s+(?:(?:{})\.?|\p{{Alphabetic}}\.)\s+", markers))?,
            placeholder: compile(r"(?i)species inquirenda|incertae sedis|unplaced")?,
            cultivar: compile(r"\p{Lu}\p{Ll}+\s+(?:\p{Ll}+\s+)?'[\w\s]+'")?,
            invalid: compile(r"^[^\p{Alphabetic}]*$")?,
            doubtful: compile(r"(?:^| )(?:undet|indet|aff|cf)[#!?.]?(?:$|[^a-z])")?,
            higher_scientific: compile(
                r"^\p{Lu}[\p{Alphabetic}\-]+(?:\s+\p{Alphabetic}[\p{Alphabetic}\-]+)?$",
            )?,
            lower_scientific: compile(
                r"^\p{Lu}[\p{Alphabetic}\-]+\s+\p{Ll}[\p{Ll}\-]+(?:\s+\p{Ll}[\p{Ll}\-]+)?$",
            )?,
            non_name: compile(r#"[^A-Za-z0-9'"\- ]+"#)?,
            informal: Vec::new(),
        })
    }

    /// Add whole-name patterns that mark a name as informal.
    pub fn with_informal_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for p in patterns {
            self.informal.push(compile(&format!("^(?:{})$", p.as_ref()))?);
        }
        Ok(self)
    }

    fn normalise(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let name = self.escapes.replace_all(name, "$1");
        let name = name.replace('\\', "");
        let name = self.bracketed.replace_all(&name, " ");
        let name = self.author_and.replace_all(&name, " & ");
        let name = self.spaces.replace_all(&name, " ");
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn strip_embedded_author(&self, name: &str, author: &str) -> String {
        match name.find(author) {
            Some(p) => {
                let left = &name[..p];
                let right = &name[p + author.len()..];
                let right = self.year_marker.replace(right, " ");
                format!("{} {}", left, right).trim().to_string()
            }
            None => name.to_string(),
        }
    }

    fn classify(
        &self,
        input: &NameInput<'_>,
        name: &str,
        initial: NameType,
    ) -> (NameType, Option<String>) {
        let rank = input.rank.filter(|r| !r.is_loose());
        if input.status == Some(TaxonomicType::MiscellaneousLiterature) {
            (NameType::Informal, None)
        } else if self.placeholder.is_match(name)
            || input.status.map(|s| s.is_placeholder()).unwrap_or(false)
        {
            (NameType::Placeholder, Some(format!("{} {}", name, Uuid::new_v4())))
        } else if input.code == Some(NomenclaturalCode::Virus) {
            (NameType::Virus, None)
        } else if input.code == Some(NomenclaturalCode::Bacterial) {
            (NameType::Scientific, None)
        } else if name.contains(" x ") {
            (NameType::Hybrid, None)
        } else if input.code == Some(NomenclaturalCode::Cultivars) || self.cultivar.is_match(name) {
            (NameType::Cultivar, None)
        } else if self.invalid.is_match(name) {
            (NameType::NoName, Some(Uuid::new_v4().to_string()))
        } else if self.doubtful.is_match(name) {
            (NameType::Doubtful, None)
        } else if rank.is_none()
            && (self.higher_scientific.is_match(name) || self.lower_scientific.is_match(name))
        {
            (NameType::Scientific, None)
        } else if rank.map(|r| r.is_higher_than(Rank::Species)).unwrap_or(false)
            && self.higher_scientific.is_match(name)
        {
            (NameType::Scientific, None)
        } else if self.lower_scientific.is_match(name) {
            (NameType::Scientific, None)
        } else if self.is_informal(name) {
            (NameType::Informal, None)
        } else {
            (initial, None)
        }
    }
}

impl NameAnalyser for BasicNameAnalyser {
    fn analyse(&self, input: &NameInput<'_>) -> AnalysisResult {
        let mut name = self.normalise(input.name).unwrap_or_default();
        let mut author = input.author.and_then(|a| self.normalise(a));
        let mut flags = input.flags.clone();

        if let Some(a) = &author {
            name = self.strip_embedded_author(&name, a);
        }
        let initial = if self.unsure_marker.is_match(&name) {
            NameType::Doubtful
        } else {
            NameType::Informal
        };
        let cleaned = self.parenthesis.replace_all(&name, " ");
        let cleaned = self.loose_markers.replace_all(&cleaned, " ").to_string();

        let (name_type, replacement) = self.classify(input, &cleaned, initial);
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        let autonym = words.len() == 3
            && words[1] == words[2]
            && words[1].chars().all(|c| c.is_lowercase());
        if autonym {
            flags.insert(TaxonFlag::Autonym);
            author = None;
        }

        let rank = input.rank.unwrap_or(Rank::Unranked);
        let display = replacement.unwrap_or_else(|| cleaned.clone());
        let display = self.non_name.replace_all(&display, " ");
        let display = self.spaces.replace_all(&display, " ").trim().to_uppercase();

        let key = NameKey::new(
            &self.comparator,
            input.code,
            display,
            author,
            rank,
            name_type,
            flags,
        );

        let mut result = AnalysisResult {
            key,
            mononomial: None,
            genus: None,
            specific_epithet: None,
            infraspecific_epithet: None,
            cultivar_epithet: None,
        };
        let structured = !matches!(name_type, NameType::Placeholder | NameType::NoName);
        if let Some(first) = words.first().filter(|_| structured) {
            let is_rank_word = first.parse::<Rank>().is_ok();
            if !is_rank_word && first.chars().next().map(char::is_uppercase).unwrap_or(false) {
                let mononomial = first.to_string();
                if !rank.is_higher_than(Rank::Genus) {
                    result.genus = Some(mononomial.clone());
                }
                result.mononomial = Some(mononomial);
                let epithet = |w: &&str| w.chars().all(|c| c.is_lowercase() || c == '-');
                result.specific_epithet = words.get(1).copied().filter(epithet).map(|s| s.to_string());
                if result.specific_epithet.is_some() {
                    result.infraspecific_epithet =
                        words.get(2).copied().filter(epithet).map(|s| s.to_string());
                }
                if name_type == NameType::Cultivar {
                    result.cultivar_epithet = cleaned
                        .split('\'')
                        .nth(1)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty());
                }
            }
        }
        result
    }

    fn author_comparator(&self) -> &AuthorComparator {
        &self.comparator
    }

    fn is_informal(&self, name: &str) -> bool {
        self.informal.iter().any(|p| p.is_match(name))
    }

    fn infer_rank(&self, name: &str, hint: Option<Rank>) -> Option<Rank> {
        let words: Vec<&str> = name.split_whitespace().collect();
        for w in words.iter().skip(1) {
            let bare = w.trim_end_matches('.').to_lowercase();
            if let Some((_, rank)) = RANK_MARKERS.iter().find(|(m, _)| *m == bare) {
                return Some(*rank);
            }
        }
        let lower = |w: &&str| w.chars().all(|c| c.is_lowercase() || c == '-');
        match words.as_slice() {
            [_, second, third] if lower(second) && lower(third) => Some(
                hint.filter(|r| !r.is_higher_than(Rank::Subspecies) && !r.is_loose())
                    .unwrap_or(Rank::Infraspecificname),
            ),
            [_, second] if lower(second) => Some(Rank::Species),
            [single] => {
                let lower = single.to_lowercase();
                SUFFIX_RANKS
                    .iter()
                    .find(|(suffix, _)| lower.ends_with(suffix))
                    .map(|(_, rank)| *rank)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyser() -> BasicNameAnalyser {
        BasicNameAnalyser::new().unwrap()
    }

    #[test]
    fn strips_embedded_author_and_uppercases() {
        let a = analyser();
        let r = a.analyse(
            &NameInput::new("Canis lupus Linnaeus, 1758")
                .code(Some(NomenclaturalCode::Zoological))
                .author(Some("Linnaeus")),
        );
        assert_eq!(r.key.name(), "CANIS LUPUS");
        assert_eq!(r.key.author(), Some("Linnaeus"));
        assert_eq!(r.key.name_type(), NameType::Scientific);
        assert_eq!(r.genus.as_deref(), Some("Canis"));
        assert_eq!(r.specific_epithet.as_deref(), Some("lupus"));
    }

    #[test]
    fn placeholders_get_unique_names() {
        let a = analyser();
        let input = NameInput::new("Acacia incertae sedis");
        let r1 = a.analyse(&input);
        let r2 = a.analyse(&input);
        assert_eq!(r1.key.name_type(), NameType::Placeholder);
        assert_ne!(r1.key, r2.key);
    }

    #[test]
    fn rank_markers_are_removed() {
        let a = analyser();
        let r = a.analyse(&NameInput::new("Acacia dealbata subsp. subalpina"));
        assert_eq!(r.key.name(), "ACACIA DEALBATA SUBALPINA");
        assert_eq!(r.key.name_type(), NameType::Scientific);
        assert_eq!(r.infraspecific_epithet.as_deref(), Some("subalpina"));
    }

    #[test]
    fn infers_rank_from_shape() {
        let a = analyser();
        assert_eq!(a.infer_rank("Acacia dealbata", None), Some(Rank::Species));
        assert_eq!(a.infer_rank("Acacia dealbata var. alpina", None), Some(Rank::Variety));
        assert_eq!(a.infer_rank("Mimosaceae", None), Some(Rank::Family));
        assert_eq!(a.infer_rank("Acacia", None), None);
    }
}
