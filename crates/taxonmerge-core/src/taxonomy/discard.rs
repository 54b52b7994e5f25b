//! Synthetic and forbidden instances.

use super::Taxonomy;
use crate::element::{ElementRef, InstanceId};
use crate::error::Result;
use crate::messages::{format_message, template};
use crate::provider::DiscardStrategy;
use crate::report::IssueType;
use ahash::AHashSet;
use rayon::prelude::*;
use taxonmerge_model::{TaxonFlag, TaxonomicType};
use taxonmerge_storage::Document;

pub const IDENTIFIER_DOCUMENT: &str = "Identifier";

impl Taxonomy {
    /// Forbid synthetic instances that no active instance uses as its
    /// resolved parent.
    pub fn detect_discards(&mut self) {
        tracing::info!(phase = "detect_discards", "detecting discarded instances");
        let required: AHashSet<InstanceId> = (0..self.instances.len())
            .into_par_iter()
            .map(InstanceId::from_index)
            .filter(|id| !self.instance(*id).forbidden)
            .filter_map(|id| self.resolved_parent(id).ok().flatten())
            .collect::<Vec<_>>()
            .into_iter()
            .collect();
        let discarded: Vec<InstanceId> = self
            .instance_ids()
            .filter(|id| {
                let tci = self.instance(*id);
                tci.has_flag(TaxonFlag::Synthetic) && !tci.forbidden && !required.contains(id)
            })
            .collect();
        for id in &discarded {
            let tci = self.instance_mut(*id);
            tci.forbidden = true;
            tci.reset_scores();
            self.count("count.resolve.synthetic.discarded");
            self.report(IssueType::Note, "instance.discarded.synthetic", Some((*id).into()), &[]);
        }
        tracing::info!(phase = "detect_discards", discarded = discarded.len(), "detected discarded instances");
    }

    /// Apply each provider's discard strategy to its forbidden instances.
    /// Instances without a resolved parent stay forbidden.
    pub fn resolve_discards(&mut self) -> Result<()> {
        tracing::info!(phase = "resolve_discards", "resolving discarded instances");
        let forbidden: Vec<InstanceId> = self.instance_ids().filter(|id| self.instance(*id).forbidden).collect();
        for id in forbidden {
            let Some(parent) = self.resolved_parent(id).ok().flatten() else {
                continue;
            };
            match self.providers.discard_strategy(self.instance(id).provider) {
                DiscardStrategy::IdentifierToParent => self.discard_to_identifier(id, parent)?,
                DiscardStrategy::SynonymiseToParent => self.discard_to_synonym(id, parent),
                DiscardStrategy::Ignore => {}
            }
        }
        self.index().commit()?;
        self.index().refresh()?;
        tracing::info!(phase = "resolve_discards", "resolved discarded instances");
        Ok(())
    }

    fn discard_to_identifier(&self, id: InstanceId, parent: InstanceId) -> Result<()> {
        let tci = self.instance(id);
        let doc = Document::new(IDENTIFIER_DOCUMENT)
            .with("taxonID", self.instance(parent).taxon_id.as_str())
            .with("identifier", tci.taxon_id.as_str())
            .with("datasetID", self.providers.get(self.providers.inference_provider()).id())
            .with("title", template("instance.discarded.identifier.title").unwrap_or_default())
            .with("status", "discarded")
            .with_opt("description", tci.remark_string())
            .with(
                "provenance",
                format_message("instance.discarded.identifier.provenance", &[tci.scientific_name.as_str()]),
            );
        self.index().add(doc)?;
        self.count("count.discard.identifier");
        Ok(())
    }

    /// Turn a forbidden instance into an inferred synonym of its parent,
    /// owned by the inference provider. Both scores are fixed at the
    /// inference provider's default score rather than recomputed, so name
    /// scores and adjustments on that provider do not apply.
    fn discard_to_synonym(&mut self, id: InstanceId, parent: InstanceId) {
        let inference = self.providers.inference_provider();
        let score = self.providers.default_score(inference);
        let parent_taxon_id = self.instance(parent).taxon_id.clone();
        let tci = self.instance_mut(id);
        tci.provider = inference;
        tci.forbidden = false;
        tci.status = TaxonomicType::InferredSynonym;
        tci.parent = None;
        tci.parent_name_usage = None;
        tci.parent_name_usage_id = None;
        tci.accepted = Some(ElementRef::Instance(parent));
        tci.accepted_name_usage = None;
        tci.accepted_name_usage_id = Some(parent_taxon_id);
        tci.set_scores(score);
        let provenance = format_message("instance.discarded.synonym.provenance", &[tci.taxon_id.as_str()]);
        tci.add_provenance(provenance);
        let container = tci.container();
        if let Some(concept) = container {
            self.resolve_concept(concept, true);
        }
        self.count("count.discard.synonym");
    }
}
