//! Taxon concept instances: one provider's statement about one taxon.

use crate::distribution::Distribution;
use crate::element::{ConceptId, ElementRef, ProviderId};
use crate::score::ScoreCell;
use crate::vernacular::VernacularName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use taxonmerge_model::{NomenclaturalCode, Rank, TaxonFlag, TaxonomicType};

/// Verbatim record as supplied by a loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceRecord {
    #[serde(rename = "taxonID")]
    pub taxon_id: String,
    #[serde(rename = "datasetID")]
    pub dataset_id: Option<String>,
    pub dataset_name: Option<String>,
    pub nomenclatural_code: Option<String>,
    pub scientific_name: String,
    pub scientific_name_authorship: Option<String>,
    pub name_complete: Option<String>,
    #[serde(alias = "namePublishedInYear")]
    pub year: Option<String>,
    pub taxonomic_status: Option<String>,
    pub taxon_rank: Option<String>,
    #[serde(rename = "parentNameUsageID")]
    pub parent_name_usage_id: Option<String>,
    pub parent_name_usage: Option<String>,
    #[serde(rename = "acceptedNameUsageID")]
    pub accepted_name_usage_id: Option<String>,
    pub accepted_name_usage: Option<String>,
    pub taxon_remarks: Option<String>,
    pub flags: Vec<String>,
    /// Higher classification hints keyed by Darwin Core term (`kingdom`, `genus` ...).
    pub classification: BTreeMap<String, String>,
    pub distribution: Vec<DistributionRecord>,
    pub vernacular_names: Vec<VernacularRecord>,
}

impl InstanceRecord {
    pub fn new(taxon_id: impl Into<String>, scientific_name: impl Into<String>) -> Self {
        Self {
            taxon_id: taxon_id.into(),
            scientific_name: scientific_name.into(),
            ..Self::default()
        }
    }

    pub fn dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.nomenclatural_code = Some(code.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.scientific_name_authorship = Some(author.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.taxonomic_status = Some(status.into());
        self
    }

    pub fn rank(mut self, rank: impl Into<String>) -> Self {
        self.taxon_rank = Some(rank.into());
        self
    }

    pub fn parent_id(mut self, id: impl Into<String>) -> Self {
        self.parent_name_usage_id = Some(id.into());
        self
    }

    pub fn parent_name(mut self, name: impl Into<String>) -> Self {
        self.parent_name_usage = Some(name.into());
        self
    }

    pub fn accepted_id(mut self, id: impl Into<String>) -> Self {
        self.accepted_name_usage_id = Some(id.into());
        self
    }

    pub fn accepted_name(mut self, name: impl Into<String>) -> Self {
        self.accepted_name_usage = Some(name.into());
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn classify(mut self, term: impl Into<String>, value: impl Into<String>) -> Self {
        self.classification.insert(term.into(), value.into());
        self
    }

    pub fn located(mut self, location_id: impl Into<String>) -> Self {
        self.distribution.push(DistributionRecord {
            location_id: location_id.into(),
            ..DistributionRecord::default()
        });
        self
    }

    pub fn vernacular(mut self, name: impl Into<String>, status: Option<&str>) -> Self {
        self.vernacular_names.push(VernacularRecord {
            vernacular_name: name.into(),
            status: status.map(str::to_string),
            ..VernacularRecord::default()
        });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DistributionRecord {
    #[serde(rename = "locationID")]
    pub location_id: String,
    pub life_stage: Option<String>,
    pub occurrence_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VernacularRecord {
    #[serde(rename = "nameID")]
    pub name_id: Option<String>,
    pub vernacular_name: String,
    pub language: Option<String>,
    pub status: Option<String>,
}

/// A resolved, typed instance living in the taxonomy arena.
///
/// `parent` and `accepted` are filled in by link resolution. Until then
/// only the raw `*_name_usage*` references are known.
#[derive(Debug, Clone)]
pub struct TaxonConceptInstance {
    pub taxon_id: String,
    pub code: Option<NomenclaturalCode>,
    pub verbatim_code: Option<String>,
    pub provider: ProviderId,
    pub scientific_name: String,
    pub author: Option<String>,
    pub name_complete: Option<String>,
    pub year: Option<String>,
    pub status: TaxonomicType,
    pub verbatim_status: Option<String>,
    pub rank: Rank,
    pub verbatim_rank: Option<String>,
    pub parent_name_usage: Option<String>,
    pub parent_name_usage_id: Option<String>,
    pub accepted_name_usage: Option<String>,
    pub accepted_name_usage_id: Option<String>,
    pub remarks: Vec<String>,
    pub verbatim_remarks: Option<String>,
    pub provenance: Vec<String>,
    pub classification: Option<BTreeMap<String, String>>,
    pub flags: BTreeSet<TaxonFlag>,
    pub distribution: Option<Vec<Distribution>>,
    pub vernaculars: Vec<VernacularName>,
    pub forbidden: bool,
    pub(crate) parent: Option<ElementRef>,
    pub(crate) accepted: Option<ElementRef>,
    pub(crate) container: Option<ConceptId>,
    pub(crate) base_score: ScoreCell,
    pub(crate) score: ScoreCell,
}

impl TaxonConceptInstance {
    pub fn new(
        taxon_id: impl Into<String>,
        provider: ProviderId,
        code: Option<NomenclaturalCode>,
        scientific_name: impl Into<String>,
        status: TaxonomicType,
        rank: Rank,
    ) -> Self {
        Self {
            taxon_id: taxon_id.into(),
            code,
            verbatim_code: None,
            provider,
            scientific_name: scientific_name.into(),
            author: None,
            name_complete: None,
            year: None,
            status,
            verbatim_status: None,
            rank,
            verbatim_rank: None,
            parent_name_usage: None,
            parent_name_usage_id: None,
            accepted_name_usage: None,
            accepted_name_usage_id: None,
            remarks: Vec::new(),
            verbatim_remarks: None,
            provenance: Vec::new(),
            classification: None,
            flags: BTreeSet::new(),
            distribution: None,
            vernaculars: Vec::new(),
            forbidden: false,
            parent: None,
            accepted: None,
            container: None,
            base_score: ScoreCell::new(),
            score: ScoreCell::new(),
        }
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.parent
    }

    pub fn accepted(&self) -> Option<ElementRef> {
        self.accepted
    }

    pub fn container(&self) -> Option<ConceptId> {
        self.container
    }

    pub fn has_flag(&self, flag: TaxonFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    pub fn is_synonym(&self) -> bool {
        self.status.is_synonym()
    }

    pub fn is_inferred_synonym(&self) -> bool {
        self.status == TaxonomicType::InferredSynonym
    }

    /// Primary statuses compete for principal. Synthetic instances never do.
    pub fn is_primary(&self) -> bool {
        self.status.is_primary() && !self.has_flag(TaxonFlag::Synthetic)
    }

    pub fn is_geographic(&self) -> bool {
        self.status.is_geographic() && !self.has_flag(TaxonFlag::Synthetic)
    }

    pub fn is_output(&self) -> bool {
        !self.forbidden && self.status.is_output()
    }

    pub fn display_name(&self) -> String {
        if let Some(complete) = &self.name_complete {
            return complete.clone();
        }
        match &self.author {
            Some(a) => format!("{} {}", self.scientific_name, a),
            None => self.scientific_name.clone(),
        }
    }

    pub fn remark_string(&self) -> Option<String> {
        if self.remarks.is_empty() {
            None
        } else {
            Some(self.remarks.join(" | "))
        }
    }

    pub fn provenance_string(&self) -> Option<String> {
        if self.provenance.is_empty() {
            None
        } else {
            Some(self.provenance.join(" | "))
        }
    }

    pub fn add_remark(&mut self, remark: impl Into<String>) {
        self.remarks.push(remark.into());
    }

    pub fn add_provenance(&mut self, statement: impl Into<String>) {
        self.provenance.push(statement.into());
    }

    /// Present values are never overwritten.
    pub fn add_classification_hint(&mut self, term: &str, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        let classification = self.classification.get_or_insert_with(BTreeMap::new);
        classification
            .entry(term.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn has_classification(&self) -> bool {
        self.classification.is_some()
    }

    pub(crate) fn reset_scores(&self) {
        self.base_score.reset();
        self.score.reset();
    }

    pub(crate) fn set_scores(&self, score: i32) {
        self.base_score.set(score);
        self.score.set(score);
    }

    /// An unresolved parent reference, or an accepted taxon below phylum with
    /// a classification but nowhere to hang.
    pub fn has_invalid_parent(&self) -> bool {
        if self.parent.is_some() {
            return false;
        }
        let mut check = self.parent_name_usage_id.is_some() || self.parent_name_usage.is_some();
        if self.is_accepted() && !self.rank.is_higher_than(Rank::Phylum) {
            if let Some(classification) = &self.classification {
                check = check || classification.values().any(|v| *v != self.scientific_name);
            }
        }
        check
    }

    pub(crate) fn normalise(&mut self) {
        if self.accepted_name_usage_id.as_deref() == Some(self.taxon_id.as_str()) {
            self.accepted_name_usage_id = None;
        }
        if let Some(author) = self.author.as_deref().filter(|a| !a.is_empty()) {
            if let Some(pos) = self.scientific_name.find(author) {
                let mut name = self.scientific_name[..pos].to_string();
                name.push_str(&self.scientific_name[pos + author.len()..]);
                self.scientific_name = name.trim().to_string();
            }
        }
    }
}

impl fmt::Display for TaxonConceptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TCI[{}, {}, {}, {}, {}]",
            self.taxon_id,
            self.code.map(|c| c.acronym()).unwrap_or("no code"),
            self.display_name(),
            self.rank,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(name: &str) -> TaxonConceptInstance {
        TaxonConceptInstance::new(
            "t1",
            ProviderId::from_index(0),
            Some(NomenclaturalCode::Zoological),
            name,
            TaxonomicType::Accepted,
            Rank::Species,
        )
    }

    #[test]
    fn normalise_strips_embedded_author_and_self_acceptance() {
        let mut tci = instance("Canis lupus Linnaeus, 1758");
        tci.author = Some("Linnaeus, 1758".into());
        tci.accepted_name_usage_id = Some("t1".into());
        tci.normalise();
        assert_eq!(tci.scientific_name, "Canis lupus");
        assert_eq!(tci.accepted_name_usage_id, None);
    }

    #[test]
    fn classification_hints_never_overwrite() {
        let mut tci = instance("Canis lupus");
        assert!(!tci.has_classification());
        tci.add_classification_hint("genus", Some("Canis"));
        tci.add_classification_hint("genus", Some("Vulpes"));
        tci.add_classification_hint("family", None);
        let c = tci.classification.as_ref().unwrap();
        assert_eq!(c.get("genus").map(String::as_str), Some("Canis"));
        assert!(!c.contains_key("family"));
    }

    #[test]
    fn invalid_parent_from_dangling_classification() {
        let mut tci = instance("Canis lupus");
        assert!(!tci.has_invalid_parent());
        tci.add_classification_hint("genus", Some("Canis"));
        assert!(tci.has_invalid_parent());
        tci.parent = Some(ElementRef::Instance(crate::element::InstanceId::from_index(3)));
        assert!(!tci.has_invalid_parent());
    }

    #[test]
    fn synthetic_instances_are_not_primary() {
        let mut tci = instance("Canis lupus");
        assert!(tci.is_primary());
        tci.flags.insert(TaxonFlag::Synthetic);
        assert!(!tci.is_primary());
    }
}
