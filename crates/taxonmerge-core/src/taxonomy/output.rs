//! Output views over a resolved taxonomy.

use super::Taxonomy;
use crate::element::{ConceptId, InstanceId};
use crate::error::ResolutionError;
use crate::report::IssueType;
use crate::DEFAULT_UNKNOWN_TAXON_ID;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use taxonmerge_model::OccurrenceStatus;

/// A taxon as a writer sees it. Missing parents and accepted taxa are
/// omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTaxon {
    #[serde(rename = "taxonID")]
    pub taxon_id: String,
    #[serde(rename = "datasetID")]
    pub dataset_id: String,
    pub scientific_name: String,
    #[serde(rename = "scientificNameAuthorship", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_complete: Option<String>,
    pub taxon_rank: String,
    pub taxonomic_status: String,
    #[serde(rename = "parentNameUsageID", skip_serializing_if = "Option::is_none")]
    pub parent_name_usage_id: Option<String>,
    #[serde(rename = "acceptedNameUsageID", skip_serializing_if = "Option::is_none")]
    pub accepted_name_usage_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    #[serde(rename = "taxonRemarks", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<OutputDistribution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vernacular_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDistribution {
    #[serde(rename = "locationID")]
    pub location_id: String,
    pub locality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_status: Option<OccurrenceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: String,
    pub providers: usize,
    pub instances: usize,
    pub concepts: usize,
    pub resolved_concepts: usize,
    pub cleared_concepts: usize,
    pub output_taxa: usize,
    pub issues: BTreeMap<String, u64>,
    pub counts: BTreeMap<String, u64>,
}

impl Taxonomy {
    /// Every output-eligible used instance of every uncleared, resolved
    /// concept, in concept order.
    pub fn output_taxa(&self) -> Vec<OutputTaxon> {
        let taxa: Vec<Vec<OutputTaxon>> = (0..self.concepts.len())
            .into_par_iter()
            .map(ConceptId::from_index)
            .map(|id| self.concept_output(id))
            .collect();
        let taxa: Vec<OutputTaxon> = taxa.into_iter().flatten().collect();
        tracing::info!(taxa = taxa.len(), "built output taxa");
        taxa
    }

    fn concept_output(&self, id: ConceptId) -> Vec<OutputTaxon> {
        let concept = self.concept(id);
        if concept.is_cleared() {
            return Vec::new();
        }
        let Some(resolution) = concept.resolution() else {
            return Vec::new();
        };
        let vernacular = concept.preferred().map(|v| v.vernacular_name.clone());
        self.output_instances(id)
            .map(|i| {
                let mut taxon = self.output_instance(i);
                if resolution.is_principal(i) {
                    taxon.vernacular_name = vernacular.clone();
                }
                if let Some(d) = resolution.distribution(i) {
                    taxon.distribution = Some(self.output_distribution(d));
                }
                taxon
            })
            .collect()
    }

    fn output_instances(&self, id: ConceptId) -> impl Iterator<Item = InstanceId> + '_ {
        let concept = self.concept(id);
        let used = match concept.resolution() {
            Some(r) if !concept.is_cleared() => r.used(),
            _ => &[],
        };
        used.iter()
            .copied()
            .filter(move |i| self.instance(*i).is_output() && self.instance(*i).container() == Some(id))
    }

    fn output_instance(&self, id: InstanceId) -> OutputTaxon {
        let tci = self.instance(id);
        let mut parent = None;
        let mut accepted = None;
        if tci.accepted().is_some() {
            accepted = self
                .output_link(id, "accepted", self.resolved_accepted(id))
                .filter(|a| *a != tci.taxon_id);
        } else {
            parent = self.output_link(id, "parent", self.resolved_parent(id));
        }
        OutputTaxon {
            taxon_id: tci.taxon_id.clone(),
            dataset_id: self.providers.get(tci.provider).id().to_string(),
            scientific_name: tci.scientific_name.clone(),
            author: tci.author.clone(),
            name_complete: tci.name_complete.clone(),
            taxon_rank: tci.rank.label().to_string(),
            taxonomic_status: tci.status.term().to_string(),
            parent_name_usage_id: parent,
            accepted_name_usage_id: accepted,
            provenance: tci.provenance_string(),
            remarks: tci.remark_string(),
            distribution: tci.distribution.as_deref().map(|d| self.output_distribution(d)),
            vernacular_name: None,
        }
    }

    /// The taxon id of a resolved link. A chase failure falls back to the
    /// provider's unknown taxon.
    fn output_link(
        &self,
        id: InstanceId,
        kind: &str,
        link: std::result::Result<Option<InstanceId>, ResolutionError>,
    ) -> Option<String> {
        match link {
            Ok(link) => link.map(|l| self.instance(l).taxon_id.clone()),
            Err(err) => {
                let tci = self.instance(id);
                tracing::error!(taxon_id = %tci.taxon_id, kind, error = %err, "unable to resolve output link");
                self.report_args(
                    IssueType::Error,
                    "taxonomy.output.resolution",
                    &[tci.taxon_id.clone(), kind.to_string(), err.to_string()],
                );
                let unknown = self
                    .providers
                    .unknown_taxon_id(tci.provider)
                    .unwrap_or(DEFAULT_UNKNOWN_TAXON_ID);
                Some(unknown.to_string())
            }
        }
    }

    fn output_distribution(&self, distribution: &[crate::distribution::Distribution]) -> Vec<OutputDistribution> {
        distribution
            .iter()
            .map(|d| {
                let location = self.locations.get(d.location);
                OutputDistribution {
                    location_id: location.location_id.clone(),
                    locality: location.locality.clone(),
                    life_stage: d.life_stage.clone(),
                    occurrence_status: d.occurrence_status,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let issues = [
            IssueType::Error,
            IssueType::Validation,
            IssueType::Problem,
            IssueType::Collision,
            IssueType::Note,
        ]
        .into_iter()
        .map(|kind| (kind.label().to_string(), self.reporter.tally(kind)))
        .collect();
        Summary {
            id: self.config.id.clone(),
            providers: self.providers.len(),
            instances: self.instances.len(),
            concepts: self.concepts.len(),
            resolved_concepts: self.concepts.iter().filter(|c| c.is_resolved()).count(),
            cleared_concepts: self.concepts.iter().filter(|c| c.is_cleared()).count(),
            output_taxa: self.concept_ids().map(|id| self.output_instances(id).count()).sum(),
            issues,
            counts: self.counts(),
        }
    }
}
