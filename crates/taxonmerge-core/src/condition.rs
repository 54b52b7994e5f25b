//! Provider conditions, score adjustment and key adjustment.
//!
//! Conditions are serialised with a `type` tag:
//!
//! ```json
//! { "type": "or", "any": [
//!     { "type": "match", "scientificName": "Incertae.*", "matchType": "REGEX" },
//!     { "type": "match", "taxonomicStatus": "MISAPPLIED" } ] }
//! ```

use crate::instance::TaxonConceptInstance;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use taxonmerge_model::{
    AuthorComparator, NameKey, NameType, NomenclaturalCode, Rank, TaxonFlag, TaxonomicType,
};

/// What a condition sees besides the instance itself.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub dataset_id: &'a str,
    pub key: Option<&'a NameKey>,
    pub authors: &'a AuthorComparator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameMatchType {
    #[default]
    Exact,
    Insensitive,
    Normalised,
    Regex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaxonCondition {
    Match(MatchTaxonCondition),
    And { all: Vec<TaxonCondition> },
    Or { any: Vec<TaxonCondition> },
}

impl TaxonCondition {
    pub fn matches(&self, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> bool {
        match self {
            TaxonCondition::Match(m) => m.matches(instance, ctx),
            TaxonCondition::And { all } => all.iter().all(|c| c.matches(instance, ctx)),
            TaxonCondition::Or { any } => any.iter().any(|c| c.matches(instance, ctx)),
        }
    }

    /// Human readable description, used as the reason for forbidding.
    pub fn explain(&self) -> String {
        match self {
            TaxonCondition::Match(m) => m.explain(),
            TaxonCondition::And { all } => join(all, " AND "),
            TaxonCondition::Or { any } => join(any, " OR "),
        }
    }
}

fn join(conditions: &[TaxonCondition], separator: &str) -> String {
    conditions
        .iter()
        .map(TaxonCondition::explain)
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, Clone, Default)]
struct Pattern(OnceLock<Option<Regex>>);

impl Pattern {
    fn get(&self, pattern: &str, case_insensitive: bool) -> Option<&Regex> {
        self.0
            .get_or_init(|| {
                match RegexBuilder::new(&format!("^(?:{})$", pattern))
                    .case_insensitive(case_insensitive)
                    .build()
                {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern, error = %e, "invalid condition pattern");
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// Match on any combination of instance fields. Absent fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchTaxonCondition {
    pub nomenclatural_code: Option<NomenclaturalCode>,
    #[serde(rename = "datasetID")]
    pub dataset_id: Option<String>,
    pub scientific_name: Option<String>,
    pub scientific_name_authorship: Option<String>,
    pub match_type: NameMatchType,
    pub taxonomic_status: Option<TaxonomicType>,
    pub name_type: Option<NameType>,
    pub taxon_rank: Option<Rank>,
    pub year: Option<String>,
    pub taxonomic_flag: Option<TaxonFlag>,
    #[serde(skip)]
    name_pattern: Pattern,
    #[serde(skip)]
    author_pattern: Pattern,
}

impl MatchTaxonCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>, match_type: NameMatchType) -> Self {
        self.scientific_name = Some(name.into());
        self.match_type = match_type;
        self.name_pattern = Pattern::default();
        self
    }

    pub fn with_status(mut self, status: TaxonomicType) -> Self {
        self.taxonomic_status = Some(status);
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.taxon_rank = Some(rank);
        self
    }

    pub fn with_dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    pub fn with_flag(mut self, flag: TaxonFlag) -> Self {
        self.taxonomic_flag = Some(flag);
        self
    }

    pub fn into_condition(self) -> TaxonCondition {
        TaxonCondition::Match(self)
    }

    pub fn matches(&self, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> bool {
        if self.nomenclatural_code.is_some() && self.nomenclatural_code != instance.code {
            return false;
        }
        if let Some(dataset) = &self.dataset_id {
            if dataset != ctx.dataset_id {
                return false;
            }
        }
        if !self.match_name(&instance.scientific_name) {
            return false;
        }
        if !self.match_author(instance.author.as_deref(), ctx.authors) {
            return false;
        }
        if self.taxonomic_status.is_some_and(|s| s != instance.status) {
            return false;
        }
        if let (Some(nt), Some(key)) = (self.name_type, ctx.key) {
            if nt != key.name_type() {
                return false;
            }
        }
        if self.taxon_rank.is_some_and(|r| r != instance.rank) {
            return false;
        }
        if let Some(year) = &self.year {
            if instance.year.as_deref() != Some(year.as_str()) {
                return false;
            }
        }
        if let Some(flag) = self.taxonomic_flag {
            if !instance.has_flag(flag) {
                return false;
            }
        }
        true
    }

    fn match_name(&self, name: &str) -> bool {
        let Some(wanted) = &self.scientific_name else {
            return true;
        };
        let name = name.trim();
        match self.match_type {
            NameMatchType::Exact => wanted.trim() == name,
            NameMatchType::Insensitive => insensitive(wanted) == insensitive(name),
            NameMatchType::Normalised => normalised(wanted) == normalised(name),
            NameMatchType::Regex => self
                .name_pattern
                .get(wanted, true)
                .is_some_and(|re| re.is_match(name)),
        }
    }

    fn match_author(&self, author: Option<&str>, authors: &AuthorComparator) -> bool {
        let Some(wanted) = &self.scientific_name_authorship else {
            return true;
        };
        let Some(author) = author.map(str::trim) else {
            return false;
        };
        match self.match_type {
            NameMatchType::Exact => wanted.trim() == author,
            NameMatchType::Insensitive => insensitive(wanted) == insensitive(author),
            NameMatchType::Normalised => authors.equivalent(wanted.trim(), author),
            NameMatchType::Regex => self
                .author_pattern
                .get(wanted, false)
                .is_some_and(|re| re.is_match(author)),
        }
    }

    pub fn explain(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut push = |label: &str, value: Option<String>| {
            if let Some(v) = value {
                parts.push(format!("{}:{}", label, v));
            }
        };
        push("nomenclaturalCode", self.nomenclatural_code.map(|c| c.to_string()));
        push("datasetID", self.dataset_id.clone());
        push(
            "scientificName",
            self.scientific_name
                .as_ref()
                .map(|n| format!("{},{:?}", n, self.match_type)),
        );
        push(
            "scientificNameAuthorship",
            self.scientific_name_authorship
                .as_ref()
                .map(|a| format!("{},{:?}", a, self.match_type)),
        );
        push("taxonomicStatus", self.taxonomic_status.map(|s| s.to_string()));
        push("nameType", self.name_type.map(|t| format!("{:?}", t)));
        push("taxonRank", self.taxon_rank.map(|r| r.to_string()));
        push("year", self.year.clone());
        push("taxonomicFlag", self.taxonomic_flag.map(|f| format!("{:?}", f)));
        parts.join(" ")
    }
}

fn insensitive(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Upper case, ligatures expanded, punctuation and rank markers dropped.
fn normalised(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'æ' | 'Æ' => out.push_str("AE"),
            'œ' | 'Œ' => out.push_str("OE"),
            'ë' | 'é' | 'è' | 'ê' => out.push('E'),
            'ï' | 'í' => out.push('I'),
            'ö' | 'ó' => out.push('O'),
            'ü' | 'ú' => out.push('U'),
            'á' | 'à' | 'ä' => out.push('A'),
            c if c.is_alphanumeric() || c.is_whitespace() => out.extend(c.to_uppercase()),
            _ => out.push(' '),
        }
    }
    out.split_whitespace()
        .filter(|w| !matches!(*w, "SUBSP" | "SSP" | "VAR" | "F" | "FORMA"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Score and key adjustment
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub condition: TaxonCondition,
    pub delta: i32,
}

/// Forbidden conditions plus conditional score deltas for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreAdjuster {
    pub forbidden: Vec<TaxonCondition>,
    pub adjustments: Vec<ScoreAdjustment>,
}

impl ScoreAdjuster {
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty() && self.adjustments.is_empty()
    }

    /// Explanation of the first forbidden condition that matches.
    pub fn forbid(&self, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> Option<String> {
        self.forbidden
            .iter()
            .find(|c| c.matches(instance, ctx))
            .map(TaxonCondition::explain)
    }

    /// Add the delta of every matching adjustment. The result is not clamped.
    pub fn score(&self, base: i64, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> i64 {
        self.adjustments
            .iter()
            .filter(|a| a.condition.matches(instance, ctx))
            .fold(base, |score, a| score + a.delta as i64)
    }
}

/// Rewrite part of an analysed key when the condition matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAdjustment {
    pub condition: TaxonCondition,
    #[serde(default)]
    pub nomenclatural_code: Option<NomenclaturalCode>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    /// An empty string removes the author.
    #[serde(default)]
    pub scientific_name_authorship: Option<String>,
    #[serde(default)]
    pub name_type: Option<NameType>,
    #[serde(default)]
    pub rank: Option<Rank>,
}

impl KeyAdjustment {
    pub fn adjust(&self, key: NameKey, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> NameKey {
        let ctx = MatchContext {
            key: Some(&key),
            ..*ctx
        };
        if !self.condition.matches(instance, &ctx) {
            return key;
        }
        let author = self
            .scientific_name_authorship
            .as_deref()
            .map(|a| if a.is_empty() { None } else { Some(a) });
        key.adjusted(
            ctx.authors,
            self.nomenclatural_code,
            self.scientific_name.as_deref(),
            author,
            self.name_type,
            self.rank,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyAdjuster {
    pub adjustments: Vec<KeyAdjustment>,
}

impl KeyAdjuster {
    pub fn adjust(&self, key: NameKey, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> NameKey {
        self.adjustments
            .iter()
            .fold(key, |key, a| a.adjust(key, instance, ctx))
    }
}
