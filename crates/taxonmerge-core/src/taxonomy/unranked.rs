//! Moving unranked instances onto ranked concepts.
//!
//! An unranked instance whose provider allows it is given an estimated rank.
//! A ranked copy takes over its taxon id and the original becomes a forbidden
//! inferred synonym of the copy.

use super::Taxonomy;
use crate::element::{ConceptId, ElementRef, InstanceId, ScientificNameId, UnrankedNameId};
use crate::error::{Result, TaxonomyError};
use crate::messages::format_message;
use crate::report::IssueType;
use std::collections::BTreeSet;
use taxonmerge_model::{NameInput, Rank, TaxonomicType};
use uuid::Uuid;

impl Taxonomy {
    /// Reassign the unranked instances that are (or, with `accepted` false,
    /// are not) accepted.
    pub fn resolve_unranked(&mut self, accepted: bool) -> Result<()> {
        tracing::info!(phase = "resolve_unranked", accepted, "resolving unranked taxa");
        let before = self.instances.len();
        for u in 0..self.unranked.len() {
            let unranked = UnrankedNameId::from_index(u);
            let names: Vec<ScientificNameId> = self
                .unranked_name(unranked)
                .children()
                .iter()
                .copied()
                .filter(|sn| self.scientific_name(*sn).rank() == Rank::Unranked)
                .collect();
            for sn in names {
                let concepts = self.scientific_name(sn).children().to_vec();
                for concept in concepts {
                    self.resolve_unranked_concept(concept, accepted, unranked)?;
                }
            }
        }
        tracing::info!(
            phase = "resolve_unranked",
            accepted,
            reassigned = self.instances.len() - before,
            "resolved unranked taxa"
        );
        Ok(())
    }

    fn resolve_unranked_concept(&mut self, concept: ConceptId, accepted: bool, unranked: UnrankedNameId) -> Result<()> {
        if self.concept(concept).key().rank() != Rank::Unranked {
            return Err(TaxonomyError::NotUnranked(self.describe(concept.into())));
        }
        let candidates: Vec<InstanceId> = self
            .concept(concept)
            .instances()
            .iter()
            .copied()
            .filter(|id| {
                let tci = self.instance(*id);
                tci.is_accepted() == accepted && self.providers.unranked_strategy(tci.provider).is_reassignable(tci)
            })
            .collect();
        let mut changed: BTreeSet<ConceptId> = BTreeSet::new();
        for id in candidates {
            let Some(rank) = self
                .resolver
                .estimate_rank(self, id, unranked)
                .filter(|r| *r != Rank::Unranked)
            else {
                continue;
            };
            let ranked = self.create_ranked_instance(id, rank);
            self.forward_to(id, ranked);
            changed.extend(self.instance(ranked).container());
        }
        if changed.is_empty() {
            return Ok(());
        }
        self.resolve_concept(concept, true);
        for c in changed {
            self.resolve_concept(c, true);
        }
        Ok(())
    }

    /// A copy of an instance at `rank`, filed under the ranked key.
    pub(crate) fn create_ranked_instance(&mut self, id: InstanceId, rank: Rank) -> InstanceId {
        let original = self.instance(id);
        let key = original
            .container()
            .map(|c| self.concept(c).key().to_ranked_name_key(rank));
        let mut ranked = original.clone();
        ranked.rank = rank;
        ranked.container = None;
        ranked.forbidden = false;
        ranked.reset_scores();
        ranked.add_provenance(format_message("taxonConcept.unranked.reallocate.provenance", &[rank.label()]));
        let key = match key {
            Some(k) => k,
            None => {
                let analysis = self.analyser.analyse(
                    &NameInput::new(&ranked.scientific_name)
                        .code(ranked.code)
                        .author(ranked.author.as_deref())
                        .rank(Some(rank)),
                );
                analysis.key
            }
        };
        let ranked = self.insert_instance(ranked, &key);
        self.report(IssueType::Note, "taxonConcept.unranked.reallocate", Some(id.into()), &[ranked.into()]);
        self.count("count.resolve.unrankedTaxonConcept");
        ranked
    }

    /// Turn `id` into a forbidden inferred synonym of `other`.
    pub(crate) fn forward_to(&mut self, id: InstanceId, other: InstanceId) {
        let other_taxon_id = self.instance(other).taxon_id.clone();
        if self.instance(id).taxon_id == other_taxon_id {
            let rekeyed = Uuid::new_v4().to_string();
            self.instance_index.insert(rekeyed.clone(), id);
            self.instance_mut(id).taxon_id = rekeyed;
        }
        let inference = self.providers.inference_provider();
        let tci = self.instance_mut(id);
        tci.forbidden = true;
        tci.provider = inference;
        tci.status = TaxonomicType::InferredSynonym;
        tci.accepted_name_usage = None;
        tci.accepted_name_usage_id = Some(other_taxon_id);
        tci.accepted = Some(ElementRef::Instance(other));
        tci.parent_name_usage = None;
        tci.parent_name_usage_id = None;
        tci.parent = None;
        tci.classification = None;
        tci.reset_scores();
    }
}
