//! Taxon resolvers.
//!
//! A resolver decides, for one concept at a time, which instances are
//! principal and what every other instance resolves onto. It only ever sees
//! an immutable [`Taxonomy`]; anything it wants changed comes back in the
//! [`ResolveOutcome`] and is applied by the caller.

use crate::distribution::{Distribution, LocationRegistry};
use crate::element::{ConceptId, ElementRef, InstanceId, ScientificNameId, UnrankedNameId};
use crate::instance::TaxonConceptInstance;
use crate::report::IssueType;
use crate::resolution::TaxonResolution;
use crate::taxonomy::Taxonomy;
use crate::MAX_RESOLUTION_STEPS;
use ahash::AHashSet;
use taxonmerge_model::Rank;

/// The result of resolving a concept.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub resolution: TaxonResolution,
    /// Instances the resolver has decided should be forbidden.
    pub forbidden: Vec<InstanceId>,
}

pub trait TaxonResolver: Send + Sync {
    /// Pick the principal instances of a concept, best first.
    fn principals(&self, taxonomy: &Taxonomy, concept: ConceptId, instances: &[InstanceId]) -> Vec<InstanceId>;

    /// Map every instance onto a used instance.
    fn resolve(
        &self,
        taxonomy: &Taxonomy,
        concept: ConceptId,
        principals: Vec<InstanceId>,
        instances: &[InstanceId],
    ) -> ResolveOutcome;

    /// Guess a rank for an unranked instance. `parent` is the unranked name
    /// that holds the instance.
    fn estimate_rank(&self, taxonomy: &Taxonomy, instance: InstanceId, parent: UnrankedNameId) -> Option<Rank>;

    /// Concepts of a name that should fold into its principal concept.
    fn secondary_concepts(&self, taxonomy: &Taxonomy, name: ScientificNameId) -> Vec<ConceptId>;

    /// Build one disjoint distribution per used instance.
    fn resolve_distribution(&self, taxonomy: &Taxonomy, concept: ConceptId, resolution: &mut TaxonResolution);

    /// Nearest common resolved ancestor of two instances.
    fn lub(&self, taxonomy: &Taxonomy, a: InstanceId, b: InstanceId) -> Option<InstanceId>;

    fn lub_all(&self, taxonomy: &Taxonomy, instances: &[InstanceId]) -> Option<InstanceId> {
        let (first, rest) = instances.split_first()?;
        rest.iter()
            .try_fold(*first, |acc, next| self.lub(taxonomy, acc, *next))
    }
}

// ============================================================================
// ALA resolver
// ============================================================================

/// The standard resolver: authority first, then a fixed cascade of matching
/// rules for everything that is not principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlaResolver;

impl AlaResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Highest score, first in iteration order on ties.
fn first_max(taxonomy: &Taxonomy, instances: &[InstanceId]) -> Option<InstanceId> {
    instances.iter().copied().fold(None, |best, id| match best {
        Some(b) if taxonomy.score(b) >= taxonomy.score(id) => Some(b),
        _ => Some(id),
    })
}

fn by_descending_score(taxonomy: &Taxonomy, instances: &mut [InstanceId]) {
    instances.sort_by(|a, b| taxonomy.score(*b).cmp(&taxonomy.score(*a)));
}

impl TaxonResolver for AlaResolver {
    fn principals(&self, taxonomy: &Taxonomy, concept: ConceptId, instances: &[InstanceId]) -> Vec<InstanceId> {
        let cutoff = taxonomy.accepted_cutoff();
        let providers = taxonomy.providers();
        let mut geographic: Vec<InstanceId> = instances
            .iter()
            .copied()
            .filter(|id| taxonomy.instance(*id).is_geographic() && taxonomy.score(*id) > cutoff)
            .collect();
        let mut principals: Vec<InstanceId> = instances
            .iter()
            .copied()
            .filter(|id| {
                let tci = taxonomy.instance(*id);
                tci.is_primary() && !tci.is_geographic() && taxonomy.score(*id) > cutoff
            })
            .collect();
        if principals.is_empty() {
            taxonomy.report(IssueType::Note, "taxonResolver.noPrincipals", Some(concept.into()), &[]);
            principals = instances
                .iter()
                .copied()
                .filter(|id| !taxonomy.instance(*id).is_geographic())
                .collect();
        }
        let authority = |id: InstanceId| providers.authority(taxonomy.instance(id).provider);
        let mut source = first_max(taxonomy, &principals).map(authority);
        if source.is_none() {
            taxonomy.report(IssueType::Note, "taxonResolver.noProvider", Some(concept.into()), &[]);
            source = first_max(taxonomy, instances).map(authority);
            principals = instances.to_vec();
        }
        let source = source.unwrap_or_else(|| providers.inference_provider());
        principals.retain(|id| authority(*id) == source);
        by_descending_score(taxonomy, &mut principals);
        by_descending_score(taxonomy, &mut geographic);
        for g in geographic {
            if !principals.contains(&g) {
                principals.push(g);
            }
        }
        principals
    }

    fn resolve(
        &self,
        taxonomy: &Taxonomy,
        _concept: ConceptId,
        principals: Vec<InstanceId>,
        instances: &[InstanceId],
    ) -> ResolveOutcome {
        let mut cascade = Cascade {
            resolver: self,
            taxonomy,
            resolution: TaxonResolution::new(principals),
            forbidden: AHashSet::new(),
        };
        for id in instances {
            cascade.resolve(*id);
        }
        let mut forbidden: Vec<InstanceId> = cascade.forbidden.into_iter().collect();
        forbidden.sort();
        ResolveOutcome {
            resolution: cascade.resolution,
            forbidden,
        }
    }

    fn estimate_rank(&self, taxonomy: &Taxonomy, instance: InstanceId, parent: UnrankedNameId) -> Option<Rank> {
        let tci = taxonomy.instance(instance);
        let accepted_rank = tci.accepted().map(|a| taxonomy.element_rank(a));
        let key = taxonomy.concept(tci.container()?).key();
        if let Some(found) = taxonomy.find_ranked_concept(parent, key, accepted_rank) {
            return Some(taxonomy.concept_rank(found));
        }
        if taxonomy.providers().unranked_strategy(tci.provider).infer_rank() {
            return taxonomy
                .analyser()
                .infer_rank(&tci.scientific_name, accepted_rank)
                .or(accepted_rank);
        }
        None
    }

    fn secondary_concepts(&self, taxonomy: &Taxonomy, name: ScientificNameId) -> Vec<ConceptId> {
        let sn = taxonomy.scientific_name(name);
        let Some(principal) = sn.principal() else {
            return Vec::new();
        };
        let providers = taxonomy.providers();
        let priority = |concept: ConceptId| {
            taxonomy
                .representative(concept.into())
                .map(|rep| providers.concept_resolution_priority(taxonomy.instance(rep).provider))
        };
        let Some(pp) = priority(principal) else {
            return Vec::new();
        };
        sn.children()
            .iter()
            .copied()
            .filter(|tc| *tc != principal)
            .filter(|tc| priority(*tc).map(|tp| pp < tp).unwrap_or(false))
            .collect()
    }

    fn resolve_distribution(&self, taxonomy: &Taxonomy, concept: ConceptId, resolution: &mut TaxonResolution) {
        let locations = taxonomy.locations();
        for used in resolution.used().to_vec() {
            let Some(base) = &taxonomy.instance(used).distribution else {
                resolution.set_distribution(used, None);
                continue;
            };
            let mut distribution = base.clone();
            for child in resolution.children(used) {
                let tci = taxonomy.instance(child);
                if child == used || !tci.is_output() || tci.container() != Some(concept) {
                    continue;
                }
                let Some(more) = &tci.distribution else {
                    continue;
                };
                let more: Vec<Distribution> = more
                    .iter()
                    .filter(|d| !distribution.iter().any(|d1| d1.covers(d, locations)))
                    .cloned()
                    .collect();
                for d in more {
                    distribution = merge_distribution(distribution, d, locations);
                }
            }
            let distribution = (!distribution.is_empty()).then_some(distribution);
            resolution.set_distribution(used, distribution);
        }
    }

    fn lub(&self, taxonomy: &Taxonomy, a: InstanceId, b: InstanceId) -> Option<InstanceId> {
        let accepted_of = |id: InstanceId| {
            taxonomy
                .instance(id)
                .accepted()
                .and_then(|e| taxonomy.representative(e))
                .unwrap_or(id)
        };
        let parent_of = |id: InstanceId| {
            taxonomy
                .instance(id)
                .parent()
                .and_then(|e| taxonomy.representative(e))
        };
        let mut i1 = Some(a);
        let mut outer = MAX_RESOLUTION_STEPS;
        while let Some(c1) = i1 {
            if outer == 0 {
                break;
            }
            outer -= 1;
            let r1 = accepted_of(c1);
            let r1_container = taxonomy.instance(r1).container();
            let mut p2 = Some(b);
            let mut inner = MAX_RESOLUTION_STEPS;
            while let Some(c2) = p2 {
                if inner == 0 {
                    break;
                }
                inner -= 1;
                let q = accepted_of(c2);
                if r1_container.is_some() && taxonomy.instance(q).container() == r1_container {
                    return Some(r1);
                }
                p2 = parent_of(q);
            }
            i1 = parent_of(c1);
        }
        None
    }
}

/// Add `dist` to a disjoint list. Entries it covers are dropped; if an entry
/// already covers it, it is not added.
fn merge_distribution(
    distribution: Vec<Distribution>,
    dist: Distribution,
    locations: &LocationRegistry,
) -> Vec<Distribution> {
    let mut merged = Vec::with_capacity(distribution.len() + 1);
    let mut pending = Some(dist);
    for d in distribution {
        let (covered, covering) = match &pending {
            Some(p) => (p.covers(&d, locations), d.covers(p, locations)),
            None => (false, false),
        };
        if covered {
            continue;
        }
        if covering {
            pending = None;
        }
        merged.push(d);
    }
    merged.extend(pending);
    merged
}

// ============================================================================
// Resolution cascade
// ============================================================================

struct Cascade<'a, R: TaxonResolver + ?Sized> {
    resolver: &'a R,
    taxonomy: &'a Taxonomy,
    resolution: TaxonResolution,
    forbidden: AHashSet<InstanceId>,
}

impl<R: TaxonResolver + ?Sized> Cascade<'_, R> {
    fn tci(&self, id: InstanceId) -> &TaxonConceptInstance {
        self.taxonomy.instance(id)
    }

    fn is_forbidden(&self, id: InstanceId) -> bool {
        self.forbidden.contains(&id) || self.tci(id).forbidden
    }

    fn concept_of(&self, id: InstanceId) -> Option<ConceptId> {
        self.tci(id).container()
    }

    fn name_of(&self, concept: Option<ConceptId>) -> Option<ScientificNameId> {
        concept.map(|c| self.taxonomy.concept(c).container())
    }

    fn accepted_instance(&self, id: InstanceId) -> Option<InstanceId> {
        self.tci(id)
            .accepted()
            .and_then(|e: ElementRef| self.taxonomy.representative(e))
    }

    fn accepted_concept(&self, id: InstanceId) -> Option<ConceptId> {
        self.accepted_instance(id).and_then(|a| self.concept_of(a))
    }

    fn first_used(&self, matches: impl Fn(InstanceId, &TaxonConceptInstance) -> bool) -> Option<InstanceId> {
        self.resolution
            .used()
            .iter()
            .copied()
            .find(|id| matches(*id, self.tci(*id)))
    }

    fn internal(&mut self, instance: InstanceId, resolved: InstanceId) {
        if self.resolution.add_internal(instance, resolved) {
            self.taxonomy
                .report(IssueType::Note, "taxonResolution.added", Some(resolved.into()), &[]);
        }
    }

    /// Map onto the lub of the unforbidden synonyms already used, if any.
    fn synonym_bound(&mut self, instance: InstanceId) -> bool {
        let synonyms: Vec<InstanceId> = self
            .resolution
            .used()
            .iter()
            .copied()
            .filter(|id| self.tci(*id).is_synonym() && !self.is_forbidden(*id))
            .collect();
        if synonyms.is_empty() {
            return false;
        }
        let Some(bound) = self.resolver.lub_all(self.taxonomy, &synonyms) else {
            return false;
        };
        self.taxonomy.report(
            IssueType::Note,
            "taxonResolver.synonyms",
            Some(instance.into()),
            &[bound.into()],
        );
        self.resolution.add_external(instance, bound);
        true
    }

    fn resolve(&mut self, id: InstanceId) {
        if self.resolution.is_principal(id) {
            self.internal(id, id);
            return;
        }
        let tci = self.tci(id);
        let status = tci.status;
        let group = status.group();
        let concept = self.concept_of(id);
        let name = self.name_of(concept);
        let accepted = self.accepted_instance(id);
        let accepted_concept = accepted.and_then(|a| self.concept_of(a));
        let accepted_name = self.name_of(accepted_concept);
        let is_accepted = tci.is_accepted();
        let is_synonym = tci.is_synonym();
        let is_primary = tci.is_primary();
        let has_accepted = tci.accepted().is_some();

        if tci.has_flag(taxonmerge_model::TaxonFlag::Synthetic) {
            let primary = self
                .resolution
                .principal()
                .iter()
                .copied()
                .find(|p| self.tci(*p).is_primary());
            self.forbidden.insert(id);
            if let Some(p) = primary {
                self.taxonomy
                    .report(IssueType::Note, "taxonResolver.synthetic.removed", Some(id.into()), &[]);
                self.taxonomy.count("count.resolve.synthetic.removed");
                self.internal(id, p);
                return;
            }
        }

        let found = if is_accepted && is_primary {
            let found = self
                .first_used(|_, u| u.is_accepted() && u.container() == concept)
                .or_else(|| {
                    self.first_used(|_, u| u.is_accepted() && name.is_some() && self.name_of(u.container()) == name)
                })
                .or_else(|| self.first_used(|_, u| u.is_accepted()));
            if found.is_none() && self.synonym_bound(id) {
                return;
            }
            found
        } else if is_synonym && is_primary && accepted.is_some() {
            let same_concept = |u: InstanceId| accepted_concept.is_some() && self.accepted_concept(u) == accepted_concept;
            let same_name = |u: InstanceId| {
                accepted_name.is_some() && self.name_of(self.accepted_concept(u)) == accepted_name
            };
            let found = self
                .first_used(|u, t| t.status == status && same_concept(u))
                .or_else(|| self.first_used(|u, t| t.status.group() == group && same_concept(u)))
                .or_else(|| self.first_used(|u, t| t.status == status && same_name(u)))
                .or_else(|| self.first_used(|u, t| t.status.group() == group && same_name(u)));
            if found.is_none() && self.synonym_bound(id) {
                return;
            }
            found
        } else if has_accepted {
            self.first_used(|u, t| {
                t.status == status && accepted_concept.is_some() && self.accepted_concept(u) == accepted_concept
            })
            .or_else(|| {
                self.first_used(|u, t| {
                    t.status == status
                        && accepted_name.is_some()
                        && self.name_of(self.accepted_concept(u)) == accepted_name
                })
            })
        } else if status.is_placeholder() || status.is_unplaced() {
            self.first_used(|_, u| concept.is_some() && u.container() == concept)
                .or_else(|| {
                    self.first_used(|_, u| accepted_name.is_some() && self.name_of(u.container()) == accepted_name)
                })
        } else {
            self.first_used(|_, u| u.status == status)
        };
        self.internal(id, found.unwrap_or(id));
    }
}
