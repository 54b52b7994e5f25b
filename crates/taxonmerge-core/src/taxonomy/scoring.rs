//! Instance scores.
//!
//! The base score is positional: a provider-specific score for the name if
//! there is one, otherwise the base score of the parent when it comes from
//! the same provider, otherwise the provider default. The score then applies
//! ownership, forbidding and the provider adjustments.

use super::Taxonomy;
use crate::condition::MatchContext;
use crate::element::{ElementRef, InstanceId};
use crate::report::IssueType;
use crate::score::clamp_score;
use crate::{MAX_RESOLUTION_STEPS, MAX_SCORE, MIN_SCORE};
use rayon::prelude::*;

impl Taxonomy {
    pub(crate) fn match_context(&self, id: InstanceId) -> MatchContext<'_> {
        let tci = self.instance(id);
        MatchContext {
            dataset_id: self.providers.get(tci.provider).id(),
            key: tci.container().map(|c| self.concept(c).key()),
            authors: self.analyser.author_comparator(),
        }
    }

    /// Memoized score, always within `[MIN_SCORE, MAX_SCORE]`.
    pub fn score(&self, id: InstanceId) -> i32 {
        self.instance(id).score.get_or_init(|| self.compute_score(id))
    }

    fn compute_score(&self, id: InstanceId) -> i32 {
        let tci = self.instance(id);
        if self.providers.owns(tci.provider, &tci.scientific_name) {
            return MAX_SCORE;
        }
        if tci.forbidden {
            return MIN_SCORE;
        }
        let base = self.base_score(id) as i64;
        let ctx = self.match_context(id);
        clamp_score(self.providers.adjust_score(tci.provider, base, tci, &ctx))
    }

    pub fn base_score(&self, id: InstanceId) -> i32 {
        self.base_score_from(id, id, MAX_RESOLUTION_STEPS)
    }

    fn base_score_from(&self, original: InstanceId, id: InstanceId, steps: usize) -> i32 {
        self.instance(id)
            .base_score
            .get_or_init(|| self.compute_base_score(original, id, steps))
    }

    fn compute_base_score(&self, original: InstanceId, id: InstanceId, steps: usize) -> i32 {
        let tci = self.instance(id);
        if let Some(specific) = self.providers.specific_score(tci.provider, &tci.scientific_name) {
            return specific;
        }
        let mut parent = tci.parent().and_then(|p| self.representative(p));
        if parent == Some(original) || parent == Some(id) {
            self.report(
                IssueType::Problem,
                "instance.parent.resolve.loop",
                Some(original.into()),
                &[id.into()],
            );
            parent = self.resolved_parent(id).ok().flatten();
        }
        let score = match parent {
            Some(p) if p != original && p != id && steps > 0 && self.instance(p).provider == tci.provider => {
                self.base_score_from(original, p, steps - 1)
            }
            _ => self.providers.default_score(tci.provider),
        };
        clamp_score(score as i64)
    }

    /// Fill every score cell ahead of resolution.
    pub fn compute_scores(&self) {
        tracing::info!(phase = "compute_scores", instances = self.instances.len(), "computing scores");
        (0..self.instances.len())
            .into_par_iter()
            .for_each(|i| {
                self.score(InstanceId::from_index(i));
            });
        tracing::info!(phase = "compute_scores", "computed scores");
    }

    /// Score of a concept or name: that of its representative.
    pub fn principal_score(&self, element: ElementRef) -> i32 {
        self.representative(element)
            .map(|id| self.score(id))
            .unwrap_or(MIN_SCORE)
    }

    /// Default score of the representative's provider.
    pub fn provider_score(&self, element: ElementRef) -> i32 {
        self.representative(element)
            .map(|id| self.providers.default_score(self.instance(id).provider))
            .unwrap_or(MIN_SCORE)
    }
}
