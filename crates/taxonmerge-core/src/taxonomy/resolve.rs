//! Concept resolution and the operations that rewrite resolved concepts.
//!
//! Concepts are resolved rank by rank, root first. Within a rank the
//! resolver runs in parallel against `&Taxonomy` and the outcomes are applied
//! once the whole rank is done.

use super::Taxonomy;
use crate::element::{ConceptId, ElementRef, InstanceId};
use crate::error::{Result, TaxonomyError};
use crate::instance::TaxonConceptInstance;
use crate::messages::format_message;
use crate::report::IssueType;
use crate::resolution::TaxonResolution;
use crate::resolver::ResolveOutcome;
use crate::vernacular::VernacularName;
use rayon::prelude::*;
use std::collections::BTreeSet;
use taxonmerge_model::TaxonomicType;
use uuid::Uuid;

impl Taxonomy {
    fn compute_resolution(&self, id: ConceptId, reset: bool) -> Option<ResolveOutcome> {
        let concept = self.concept(id);
        if concept.is_resolved() && !reset {
            return None;
        }
        let instances = concept.instances();
        let principals = self.resolver.principals(self, id, instances);
        Some(self.resolver.resolve(self, id, principals, instances))
    }

    fn apply_resolution(&mut self, id: ConceptId, outcome: ResolveOutcome) {
        for forbidden in &outcome.forbidden {
            let tci = self.instance_mut(*forbidden);
            if !tci.forbidden {
                tci.forbidden = true;
                tci.reset_scores();
            }
        }
        self.concepts[id.index()].resolution = Some(outcome.resolution);
        self.count("count.resolve.taxonConcept");
    }

    /// Resolve a single concept. A resolved concept is only redone if `reset`.
    pub fn resolve_concept(&mut self, id: ConceptId, reset: bool) {
        if let Some(outcome) = self.compute_resolution(id, reset) {
            self.apply_resolution(id, outcome);
        }
    }

    fn is_instance_resolved(&self, tci: &TaxonConceptInstance) -> bool {
        tci.container()
            .map(|c| self.concept(c).is_resolved())
            .unwrap_or(false)
    }

    /// Resolve every concept, sweeping the ranks until the number of
    /// resolved instances stops growing.
    pub fn resolve_taxon(&mut self) {
        tracing::info!(phase = "resolve_taxon", concepts = self.concepts.len(), "resolving taxa");
        let ranks = self.ordered_ranks(self.instance_ids());
        let mut resolved = 0usize;
        loop {
            for rank in &ranks {
                let concepts: BTreeSet<ConceptId> = self
                    .instances
                    .iter()
                    .filter(|tci| tci.rank == *rank)
                    .filter_map(TaxonConceptInstance::container)
                    .collect();
                let outcomes: Vec<(ConceptId, ResolveOutcome)> = concepts
                    .par_iter()
                    .filter_map(|c| self.compute_resolution(*c, false).map(|o| (*c, o)))
                    .collect();
                for (concept, outcome) in outcomes {
                    self.apply_resolution(concept, outcome);
                }
            }
            let previous = resolved;
            resolved = self
                .instances
                .iter()
                .filter(|tci| self.is_instance_resolved(tci))
                .count();
            tracing::debug!(phase = "resolve_taxon", previous, resolved, "rank sweep");
            if resolved == previous {
                break;
            }
        }
        let unresolved: BTreeSet<ConceptId> = self
            .instances
            .iter()
            .filter_map(TaxonConceptInstance::container)
            .filter(|c| !self.concept(*c).is_resolved())
            .collect();
        tracing::info!(phase = "resolve_taxon", unresolved = unresolved.len(), "unresolved concepts");
        for concept in unresolved {
            self.resolve_concept(concept, false);
            self.report(IssueType::Problem, "taxonConcept.unresolved", Some(concept.into()), &[]);
        }
        tracing::info!(phase = "resolve_taxon", "resolved taxa");
    }

    /// Move the instances of `source` into `target`, mapping each onto the
    /// target's representative. `reason` is the provenance template.
    ///
    /// The source keeps its resolution so references to it still reach the
    /// moved instances, which now resolve through the target.
    pub(crate) fn reallocate_concept(&mut self, source: ConceptId, target: ConceptId, reason: &str) -> Result<()> {
        if source == target {
            return Ok(());
        }
        let representative = self.representative(target.into());
        let resolved = self.concept(source).is_resolved() && self.concept(target).is_resolved();
        let Some(representative) = representative.filter(|_| resolved) else {
            return Err(TaxonomyError::Reallocation {
                element: self.describe(source.into()),
                target: self.describe(target.into()),
            });
        };
        self.report(IssueType::Note, "taxonConcept.reallocated", Some(source.into()), &[target.into()]);
        self.count("count.reallocate.taxonConcept");
        let rep = self.instance(representative);
        let provenance = format_message(reason, &[rep.taxon_id.clone(), rep.display_name()]);
        let moved = std::mem::take(&mut self.concepts[source.index()].instances);
        for id in moved {
            let tci = &mut self.instances[id.index()];
            tci.container = Some(target);
            tci.add_provenance(provenance.clone());
            let concept = &mut self.concepts[target.index()];
            concept.add_instance(&self.instances, id);
            if let Some(resolution) = &mut concept.resolution {
                resolution.add_external(id, representative);
            }
        }
        self.concepts[source.index()].cleared = true;
        Ok(())
    }

    /// Give an authored concept an inferred synonym of the principal's
    /// representative for each of its accepted instances, then re-resolve it
    /// with the inferred synonyms as principals.
    pub(crate) fn add_inferred_synonym(&mut self, concept: ConceptId, principal: ConceptId) -> Result<()> {
        let Some(representative) = self.representative(principal.into()) else {
            self.report(IssueType::Error, "taxonConcept.representative", Some(principal.into()), &[concept.into()]);
            return Ok(());
        };
        let accepted: Vec<InstanceId> = self
            .concept(concept)
            .used()
            .iter()
            .copied()
            .filter(|id| self.instance(*id).is_accepted())
            .collect();
        if accepted.is_empty() {
            self.report(IssueType::Error, "taxonConcept.inferredSynonyms", Some(principal.into()), &[concept.into()]);
            return Ok(());
        }
        for id in accepted {
            self.create_inferred_synonym(representative, concept, id)?;
        }
        let instances = self.concept(concept).instances().to_vec();
        let used: Vec<InstanceId> = instances
            .iter()
            .copied()
            .filter(|id| self.instance(*id).is_inferred_synonym())
            .collect();
        if used.len() > 1 {
            self.report(
                IssueType::Note,
                "taxonConcept.multipleInferredSynonyms",
                Some(concept.into()),
                &[used[0].into(), used[1].into()],
            );
        }
        let outcome = self.resolver.resolve(self, concept, used, &instances);
        self.apply_resolution(concept, outcome);
        self.count("count.resolve.inferredSynonym");
        Ok(())
    }

    /// A synonym of `accepted` carrying the name of `from`, filed into `concept`
    /// under the inference provider.
    pub(crate) fn create_inferred_synonym(
        &mut self,
        accepted: InstanceId,
        concept: ConceptId,
        from: InstanceId,
    ) -> Result<InstanceId> {
        let inference = self.providers.inference_provider();
        let target = self.instance(accepted);
        let source = self.instance(from);
        let mut synonym = TaxonConceptInstance::new(
            Uuid::new_v4().to_string(),
            inference,
            target.code,
            source.scientific_name.clone(),
            TaxonomicType::InferredSynonym,
            target.rank,
        );
        synonym.verbatim_code = target.verbatim_code.clone();
        synonym.author = source.author.clone();
        synonym.name_complete = source.name_complete.clone();
        synonym.year = source.year.clone();
        synonym.verbatim_rank = target.verbatim_rank.clone();
        synonym.accepted_name_usage_id = Some(target.taxon_id.clone());
        synonym.classification = target.classification.clone();
        synonym.flags = target.flags.clone();
        synonym.accepted = Some(ElementRef::Instance(accepted));
        synonym.add_provenance(format_message(
            "instance.inferredSynonym.provenance",
            &[target.taxon_id.as_str(), self.providers.get(target.provider).id()],
        ));
        let key = self.concept(concept).key().clone();
        self.add_inferred_instance(synonym, &key)
    }

    /// Merge distributions onto the used instances of every resolved concept.
    pub fn resolve_distributions(&mut self) {
        tracing::info!(phase = "resolve_distributions", "resolving distributions");
        let outcomes: Vec<(ConceptId, TaxonResolution)> = (0..self.concepts.len())
            .into_par_iter()
            .map(ConceptId::from_index)
            .filter_map(|id| {
                let concept = self.concept(id);
                if concept.is_cleared() {
                    return None;
                }
                let mut resolution = concept.resolution()?.clone();
                self.resolver.resolve_distribution(self, id, &mut resolution);
                Some((id, resolution))
            })
            .collect();
        let resolved = outcomes.len();
        for (id, resolution) in outcomes {
            self.concepts[id.index()].resolution = Some(resolution);
        }
        tracing::info!(phase = "resolve_distributions", concepts = resolved, "resolved distributions");
    }

    /// The best vernacular name among the output principals of a concept and
    /// the instances mapped onto them.
    fn preferred_vernacular(&self, id: ConceptId) -> Option<VernacularName> {
        let resolution = self.concept(id).resolution()?;
        let mut candidates: Vec<InstanceId> = Vec::new();
        for principal in resolution.principal() {
            if !self.instance(*principal).is_output() {
                continue;
            }
            candidates.push(*principal);
            candidates.extend(resolution.children(*principal).into_iter().filter(|c| c != principal));
        }
        let mut best: Option<(&VernacularName, (i32, i32))> = None;
        for candidate in candidates {
            let tci = self.instance(candidate);
            let provider_score = self.providers.default_score(tci.provider);
            for name in tci.vernaculars.iter().filter(|v| !v.forbidden) {
                let score = name.score(provider_score);
                if best.map(|(_, b)| score > b).unwrap_or(true) {
                    best = Some((name, score));
                }
            }
        }
        best.map(|(name, _)| name.clone())
    }

    pub fn build_preferred_vernacular(&mut self) {
        tracing::info!(phase = "build_preferred_vernacular", "building preferred vernacular names");
        let chosen: Vec<(ConceptId, VernacularName)> = (0..self.concepts.len())
            .into_par_iter()
            .map(ConceptId::from_index)
            .filter(|id| !self.concept(*id).is_cleared())
            .filter_map(|id| self.preferred_vernacular(id).map(|v| (id, v)))
            .collect();
        for (id, name) in &chosen {
            if let Some(rep) = self.representative((*id).into()) {
                let tci = self.instance(rep);
                self.report_args(
                    IssueType::Note,
                    "taxonConcept.vernacular.preferred",
                    &[tci.taxon_id.clone(), tci.display_name(), name.vernacular_name.clone()],
                );
            }
            self.count("count.vernacular.preferred");
        }
        let count = chosen.len();
        for (id, name) in chosen {
            self.concepts[id.index()].preferred = Some(name);
        }
        tracing::info!(phase = "build_preferred_vernacular", preferred = count, "built preferred vernacular names");
    }
}
