//! Structural checks, run before scoring and again after resolution.
//!
//! Every check reports what it finds; none of them stop early, so a single
//! run lists every issue.

use super::Taxonomy;
use crate::element::{ConceptId, ElementRef, InstanceId, ProviderId, ScientificNameId};
use crate::messages::format_message;
use crate::report::{Issue, IssueType};
use rayon::prelude::*;
use std::collections::BTreeMap;

impl Taxonomy {
    /// Check providers, instances and names. True if nothing fatal was found.
    pub fn validate(&self) -> bool {
        tracing::info!(phase = "validate", "starting validation");
        let providers = self
            .providers
            .ids()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|p| self.validate_provider(*p))
            .reduce(|| true, |a, b| a && b);
        let instances = (0..self.instances.len())
            .into_par_iter()
            .map(|i| self.validate_instance(InstanceId::from_index(i)))
            .reduce(|| true, |a, b| a && b);
        let names = (0..self.names.len())
            .into_par_iter()
            .map(|i| self.validate_name(ScientificNameId::from_index(i)))
            .reduce(|| true, |a, b| a && b);
        let valid = providers && instances && names;
        if valid {
            tracing::info!(phase = "validate", "finished validation");
        } else {
            tracing::error!(phase = "validate", providers, instances, names, "validation failed");
        }
        valid
    }

    fn validate_provider(&self, id: ProviderId) -> bool {
        let provider = self.providers.get(id);
        match self.providers.unknown_taxon_id(id) {
            None => {
                self.report_args(IssueType::Problem, "provider.validation.unknownTaxonID.noID", &[provider.id()]);
                true
            }
            Some(utid) if self.get_instance(utid).is_none() => {
                self.report_args(
                    IssueType::Validation,
                    "provider.validation.unknownTaxonID.notFound",
                    &[provider.id(), utid],
                );
                false
            }
            Some(_) => true,
        }
    }

    fn validate_instance(&self, id: InstanceId) -> bool {
        let tci = self.instance(id);
        let loose = self.providers.get(tci.provider).is_loose();
        let subject = Some(ElementRef::Instance(id));
        let mut valid = true;
        if tci.has_invalid_parent() {
            if loose {
                self.report(IssueType::Note, "instance.validation.noParent.loose", subject, &[]);
            } else {
                self.report(IssueType::Validation, "instance.validation.noParent", subject, &[]);
                valid = false;
            }
        }
        if (tci.accepted_name_usage_id.is_some() || tci.accepted_name_usage.is_some()) && tci.accepted().is_none() {
            if loose {
                self.report(IssueType::Note, "instance.validation.noAccepted.loose", subject, &[]);
            } else {
                self.report(IssueType::Validation, "instance.validation.noAccepted", subject, &[]);
                valid = false;
            }
        }
        if tci.parent().is_some() && tci.is_synonym() {
            self.report(IssueType::Validation, "instance.validation.synonymWithParent", subject, &[]);
            valid = false;
        }
        if tci.accepted().is_some() && tci.is_accepted() {
            self.report(IssueType::Validation, "instance.validation.acceptedWithAccepted", subject, &[]);
            valid = false;
        }
        if tci.container().is_none() {
            self.report(IssueType::Validation, "instance.validation.noTaxonConcept", subject, &[]);
            valid = false;
        }
        if valid && tci.parent().is_some() && self.find_simple_parent_loop(id).is_some() {
            let trace = self.trace_parent(id);
            self.report(IssueType::Validation, "instance.validation.parent.loop", subject, &trace);
            valid = false;
        }
        valid
    }

    fn validate_name(&self, id: ScientificNameId) -> bool {
        let name = self.scientific_name(id);
        if name.is_cleared() {
            return true;
        }
        let subject = Some(ElementRef::Scientific(id));
        let mut valid = true;
        if name.children().is_empty() {
            self.report(IssueType::Validation, "scientificName.validation.noConcepts", subject, &[]);
            valid = false;
        }
        for concept in name.children() {
            if self.concept(*concept).container() != id {
                self.report(
                    IssueType::Validation,
                    "scientificName.validation.conceptParent",
                    Some((*concept).into()),
                    &[id.into()],
                );
                valid = false;
            }
            valid = self.validate_concept(*concept) && valid;
        }
        valid
    }

    fn validate_concept(&self, id: ConceptId) -> bool {
        let concept = self.concept(id);
        if concept.is_cleared() {
            return true;
        }
        let mut valid = true;
        if concept.instances().is_empty() {
            self.report(IssueType::Validation, "taxonConcept.validation.noInstances", Some(id.into()), &[]);
            valid = false;
        }
        for instance in concept.instances() {
            let tci = self.instance(*instance);
            if tci.container() != Some(id) {
                self.report(
                    IssueType::Validation,
                    "taxonConcept.validation.instanceParent",
                    Some((*instance).into()),
                    &[id.into()],
                );
                valid = false;
            }
            if self.get_instance(&tci.taxon_id) != Some(*instance) {
                self.report(
                    IssueType::Validation,
                    "taxonConcept.validation.instanceTaxonomy",
                    Some((*instance).into()),
                    &[id.into()],
                );
                valid = false;
            }
            if let Some(resolution) = concept.resolution() {
                if resolution.resolved(*instance).is_none() {
                    self.report(
                        IssueType::Validation,
                        "taxonResolver.validation.noResolution",
                        Some((*instance).into()),
                        &[],
                    );
                    valid = false;
                }
            }
        }
        valid
    }

    /// Note scientific name strings that appear under more than one key.
    pub fn validate_name_collisions(&self) {
        tracing::info!(phase = "validate_name_collisions", "validating name collisions");
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for name in &self.names {
            *counts.entry(name.key().name()).or_default() += 1;
        }
        let mut homonyms = 0usize;
        for (name, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
            homonyms += 1;
            self.count("count.homonym");
            let message = format_message("name.homonym", &[name.to_string(), count.to_string()]);
            let mut issue = Issue::new(IssueType::Note, "name.homonym", message);
            issue.scientific_name = Some(name.to_string());
            self.reporter.record(issue);
        }
        tracing::info!(phase = "validate_name_collisions", homonyms, "validated name collisions");
    }
}
