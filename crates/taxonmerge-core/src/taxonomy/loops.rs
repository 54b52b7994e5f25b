//! Synonym and parent loop detection and repair.
//!
//! Detection follows raw `accepted` or `parent` links between instances for
//! at most [`MAX_RESOLUTION_STEPS`]. Repairs always restart from the chosen
//! break point, so repairing the same loop twice is a no-op.

use super::Taxonomy;
use crate::element::{ElementRef, InstanceId};
use crate::error::Result;
use crate::messages::{format_message, template};
use crate::report::IssueType;
use crate::MAX_RESOLUTION_STEPS;
use rayon::prelude::*;
use std::collections::BTreeSet;
use taxonmerge_model::TaxonomicType;

impl Taxonomy {
    fn instance_link(&self, link: Option<ElementRef>) -> Option<InstanceId> {
        link.and_then(ElementRef::as_instance)
    }

    /// The lowest scoring member of an accepted loop through `id`, ties going
    /// to the smallest taxon id. `None` when the accepted chain ends.
    ///
    /// A chain still going after [`MAX_RESOLUTION_STEPS`] without revisiting
    /// an instance yields the instance reached at the bound, so repair picks
    /// up the search from there.
    pub fn find_simple_synonym_loop(&self, id: InstanceId) -> Option<InstanceId> {
        let mut trace: Vec<InstanceId> = Vec::new();
        let mut current = Some(id);
        let mut steps = MAX_RESOLUTION_STEPS;
        while let Some(tci) = current {
            if steps == 0 {
                break;
            }
            if let Some(start) = trace.iter().position(|t| *t == tci) {
                let mut members = trace.split_off(start);
                members.sort_by(|a, b| {
                    self.score(*a)
                        .cmp(&self.score(*b))
                        .then_with(|| self.instance(*a).taxon_id.cmp(&self.instance(*b).taxon_id))
                });
                return members.first().copied().or(Some(tci));
            }
            trace.push(tci);
            steps -= 1;
            current = self.instance_link(self.instance(tci).accepted);
        }
        current
    }

    pub fn resolve_synonym_loop(&mut self, id: InstanceId) {
        let mut target = id;
        for _ in 0..MAX_RESOLUTION_STEPS {
            let Some(break_point) = self.find_simple_synonym_loop(target) else {
                return;
            };
            if break_point == target {
                self.break_synonym_loop(target);
                return;
            }
            target = break_point;
        }
        tracing::warn!(taxon = %self.instance(id), "synonym loop break point did not settle");
    }

    fn break_synonym_loop(&mut self, id: InstanceId) {
        let trace = self.trace_accepted(id);
        self.report(IssueType::Problem, "instance.accepted.resolve.loop", Some(id.into()), &trace);
        let unknown = self.unknown_taxon(self.instance(id).provider);
        let unknown_id = self.providers.unknown_taxon_id(self.instance(id).provider).map(str::to_string);
        let tci = self.instance_mut(id);
        tci.status = TaxonomicType::InferredUnplaced;
        tci.accepted = None;
        tci.accepted_name_usage = None;
        tci.accepted_name_usage_id = None;
        tci.reset_scores();
        if tci.parent.is_none() {
            tci.parent_name_usage = None;
            tci.parent_name_usage_id = unknown_id;
            tci.parent = unknown.map(ElementRef::Instance);
        }
        let provenance = format_message("instance.accepted.resolve.loop.provenance", &[tci.taxon_id.as_str()]);
        tci.add_provenance(provenance);
        self.count("count.resolve.loop.synonym");
    }

    /// A synonym that is the supplied parent of its own accepted taxon.
    pub fn find_simple_synonym_parent_loop(&self, id: InstanceId) -> Option<InstanceId> {
        let tci = self.instance(id);
        tci.accepted_name_usage_id.as_ref()?;
        let accepted = self.resolved_accepted(id).ok().flatten()?;
        let parent_id = self.instance(accepted).parent_name_usage_id.as_deref()?;
        (parent_id == tci.taxon_id).then_some(id)
    }

    pub fn resolve_synonym_parent_loop(&mut self, id: InstanceId) {
        let (taxon_id, accepted_id) = {
            let tci = self.instance(id);
            (tci.taxon_id.clone(), tci.accepted_name_usage_id.clone().unwrap_or_default())
        };
        self.report_args(IssueType::Problem, "instance.accepted.synonym.loop", &[taxon_id, accepted_id]);
        let provider = self.instance(id).provider;
        let unknown = self.unknown_taxon(provider);
        let unknown_id = self.providers.unknown_taxon_id(provider).map(str::to_string);
        let tci = self.instance_mut(id);
        tci.status = TaxonomicType::InferredUnplaced;
        tci.accepted = None;
        tci.accepted_name_usage = None;
        tci.accepted_name_usage_id = None;
        tci.reset_scores();
        tci.parent_name_usage = None;
        tci.parent_name_usage_id = unknown_id;
        tci.parent = unknown.map(ElementRef::Instance);
        tci.add_provenance(template("instance.accepted.synonym.loop.provenance").unwrap_or_default());
        self.count("count.resolve.loop.synonymParent");
    }

    /// The highest ranked instance on a parent chain through `id` that
    /// revisits itself. `None` when the chain ends.
    ///
    /// As with synonym loops, exhausting [`MAX_RESOLUTION_STEPS`] yields the
    /// instance reached at the bound rather than an error.
    pub fn find_simple_parent_loop(&self, id: InstanceId) -> Option<InstanceId> {
        let mut trace: Vec<InstanceId> = Vec::new();
        let mut current = Some(id);
        let mut steps = MAX_RESOLUTION_STEPS;
        while let Some(tci) = current {
            if steps == 0 {
                break;
            }
            if let Some(start) = trace.iter().position(|t| *t == tci) {
                return trace[start..]
                    .iter()
                    .copied()
                    .min_by_key(|t| self.instance(*t).rank.sort_order())
                    .or(Some(tci));
            }
            trace.push(tci);
            steps -= 1;
            current = self.instance_link(self.instance(tci).parent);
        }
        current
    }

    pub fn resolve_parent_loop(&mut self, id: InstanceId) {
        let mut target = id;
        for _ in 0..MAX_RESOLUTION_STEPS {
            let Some(break_point) = self.find_simple_parent_loop(target) else {
                return;
            };
            if break_point == target {
                self.reparent_to_unknown(target, "instance.parent.resolve.loop");
                self.count("count.resolve.loop.parent");
                return;
            }
            target = break_point;
        }
        tracing::warn!(taxon = %self.instance(id), "parent loop break point did not settle");
    }

    /// Mark an instance unplaced under its provider's unknown taxon.
    fn reparent_to_unknown(&mut self, id: InstanceId, code: &str) {
        let trace = self.trace_parent(id);
        self.report(IssueType::Problem, code, Some(id.into()), &trace);
        let provider = self.instance(id).provider;
        let unknown = self.unknown_taxon(provider);
        let unknown_id = self.providers.unknown_taxon_id(provider).map(str::to_string);
        let provenance = template(&format!("{}.provenance", code)).unwrap_or_default();
        let tci = self.instance_mut(id);
        tci.status = TaxonomicType::InferredUnplaced;
        tci.parent = unknown.map(ElementRef::Instance);
        tci.parent_name_usage = None;
        tci.parent_name_usage_id = unknown_id;
        tci.reset_scores();
        tci.add_provenance(provenance);
    }

    /// Break synonym loops, then synonym/parent loops, then parent loops with
    /// the highest ranks first.
    pub fn resolve_loops(&mut self) -> Result<()> {
        tracing::info!(phase = "resolve_loops", "resolving loops");
        let synonym_loops: BTreeSet<InstanceId> = (0..self.instances.len())
            .into_par_iter()
            .filter_map(|i| self.find_simple_synonym_loop(InstanceId::from_index(i)))
            .collect();
        for id in &synonym_loops {
            self.resolve_synonym_loop(*id);
        }

        let synonym_parent_loops: BTreeSet<InstanceId> = (0..self.instances.len())
            .into_par_iter()
            .filter_map(|i| self.find_simple_synonym_parent_loop(InstanceId::from_index(i)))
            .collect();
        for id in &synonym_parent_loops {
            self.resolve_synonym_parent_loop(*id);
        }

        let parent_loops: BTreeSet<InstanceId> = (0..self.instances.len())
            .into_par_iter()
            .filter_map(|i| self.find_simple_parent_loop(InstanceId::from_index(i)))
            .collect();
        for rank in self.ordered_ranks(parent_loops.iter().copied()) {
            for id in parent_loops.iter().copied() {
                if self.instance(id).rank == rank {
                    self.resolve_parent_loop(id);
                }
            }
        }
        tracing::info!(
            phase = "resolve_loops",
            synonym = synonym_loops.len(),
            synonym_parent = synonym_parent_loops.len(),
            parent = parent_loops.len(),
            "resolved loops"
        );
        Ok(())
    }

    /// Move instances whose supplied parent never resolved under the unknown
    /// taxon.
    pub fn resolve_invalid_parents(&mut self) -> Result<()> {
        tracing::info!(phase = "resolve_invalid_parents", "resolving invalid parents");
        let invalid: Vec<InstanceId> = (0..self.instances.len())
            .into_par_iter()
            .map(InstanceId::from_index)
            .filter(|id| self.instance(*id).has_invalid_parent())
            .collect();
        for id in &invalid {
            self.reparent_to_unknown(*id, "instance.parent.resolve.invalid");
        }
        tracing::info!(phase = "resolve_invalid_parents", invalid = invalid.len(), "resolved invalid parents");
        Ok(())
    }
}
