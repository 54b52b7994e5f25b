//! Principals for the three name levels.
//!
//! Each level sorts its children by provider score, picks a principal and
//! then folds the children that should not stand on their own into it:
//!
//! | level | principal | folded |
//! |---|---|---|
//! | scientific name | formal accepted concept, authored preferred | unauthored accepted concepts |
//! | unranked name | ranked name with a principal | unranked names |
//! | bare name | coded name with a principal | uncoded names |

use super::Taxonomy;
use crate::element::{BareNameId, ConceptId, ElementRef, ScientificNameId, UnrankedNameId};
use crate::error::{Result, TaxonomyError};
use crate::name::NameLevel;
use crate::report::IssueType;
use rayon::prelude::*;
use taxonmerge_model::Rank;

/// A principal choice plus the children in the order they were considered.
struct Choice<C> {
    principal: Option<C>,
    children: Vec<C>,
}

impl Taxonomy {
    fn by_provider_score<C: Copy + Into<ElementRef>>(&self, children: &mut [C]) {
        children.sort_by(|a, b| {
            self.provider_score((*b).into())
                .cmp(&self.provider_score((*a).into()))
        });
    }

    /// The highest principal score among `candidates`, first on ties. With
    /// more than one candidate a collision is reported, and a problem if the
    /// top scores are equal.
    fn settle_collision<C: Copy + Into<ElementRef>>(&self, subject: ElementRef, candidates: &[C], code: &str, tie_code: &str) -> C {
        let associated: Vec<ElementRef> = candidates.iter().map(|c| (*c).into()).collect();
        self.report(IssueType::Collision, code, Some(subject), &associated);
        let best = candidates
            .iter()
            .map(|c| self.principal_score((*c).into()))
            .max()
            .unwrap_or(crate::MIN_SCORE);
        let top: Vec<ElementRef> = candidates
            .iter()
            .map(|c| (*c).into())
            .filter(|c| self.principal_score(*c) == best)
            .collect();
        if top.len() > 1 {
            self.report(IssueType::Problem, tie_code, Some(subject), &top[..2]);
        }
        candidates
            .iter()
            .copied()
            .find(|c| self.principal_score((*c).into()) == best)
            .unwrap_or(candidates[0])
    }

    fn choose_concept(&self, id: ScientificNameId) -> Choice<ConceptId> {
        let mut concepts: Vec<ConceptId> = self
            .scientific_name(id)
            .children()
            .iter()
            .copied()
            .filter(|c| !self.concept(*c).is_cleared())
            .collect();
        self.by_provider_score(&mut concepts);
        if concepts.len() <= 1 {
            return Choice {
                principal: concepts.first().copied(),
                children: concepts,
            };
        }
        let cutoff = self.accepted_cutoff();
        let accepted: Vec<ConceptId> = concepts
            .iter()
            .copied()
            .filter(|c| {
                let tc = self.concept(*c);
                tc.is_formal() && tc.has_accepted(&self.instances) && self.principal_score((*c).into()) > cutoff
            })
            .collect();
        let authored: Vec<ConceptId> = accepted
            .iter()
            .copied()
            .filter(|c| self.concept(*c).is_authored())
            .collect();
        let principal = match (accepted.len(), authored.len()) {
            (0, _) => concepts[0],
            (1, _) => accepted[0],
            (_, 0) => accepted[0],
            (_, 1) => authored[0],
            _ => self.settle_collision(
                id.into(),
                &authored,
                "scientificName.collision",
                "scientificName.collision.match",
            ),
        };
        Choice {
            principal: Some(principal),
            children: concepts,
        }
    }

    /// Shared by unranked and bare names: prefer an `eligible` child with a
    /// principal scoring above the cutoff.
    fn choose_name<C>(&self, subject: ElementRef, mut names: Vec<C>, eligible: impl Fn(C) -> bool, code: &str) -> Choice<C>
    where
        C: Copy + Into<ElementRef>,
    {
        self.by_provider_score(&mut names);
        if names.len() <= 1 {
            return Choice {
                principal: names.first().copied(),
                children: names,
            };
        }
        let cutoff = self.accepted_cutoff();
        let ranked: Vec<C> = names
            .iter()
            .copied()
            .filter(|n| eligible(*n) && self.principal_score((*n).into()) > cutoff)
            .collect();
        let principal = match ranked.len() {
            0 => names[0],
            1 => ranked[0],
            _ => self.settle_collision(subject, &ranked, code, &format!("{}.warn", code)),
        };
        Choice {
            principal: Some(principal),
            children: names,
        }
    }

    fn report_principal(&self, level: NameLevel, subject: ElementRef, principal: Option<ElementRef>, children: usize) {
        match principal {
            None => self.report(
                IssueType::Problem,
                &format!("name.{}.noPrincipal", level.label()),
                Some(subject),
                &[],
            ),
            Some(p) if children > 1 => self.report(
                IssueType::Note,
                &format!("name.{}.principal", level.label()),
                Some(subject),
                &[p],
            ),
            Some(_) => {}
        }
        self.count(&format!("count.name.{}.principal", level.label()));
    }

    fn is_owned(&self, concept: ConceptId) -> bool {
        let Some(rep) = self.representative(concept.into()) else {
            return false;
        };
        let tci = self.instance(rep);
        tci.container() == Some(concept) && self.providers.owns(tci.provider, &tci.scientific_name)
    }

    /// Pick principals at every name level and fold the leftovers in.
    pub fn resolve_principal(&mut self) -> Result<()> {
        tracing::info!(phase = "resolve_principal", names = self.names.len(), "resolving principals for scientific names");
        let choices: Vec<Choice<ConceptId>> = (0..self.names.len())
            .into_par_iter()
            .map(|i| self.choose_concept(ScientificNameId::from_index(i)))
            .collect();
        for (i, choice) in choices.into_iter().enumerate() {
            let id = ScientificNameId::from_index(i);
            self.report_principal(NameLevel::Scientific, id.into(), choice.principal.map(Into::into), choice.children.len());
            let name = &mut self.names[i];
            name.set_principal(choice.principal);
            name.set_children_order(choice.children);
            if let Some(principal) = choice.principal {
                self.reallocate_dangling_concepts(id, principal)?;
            }
        }

        tracing::info!(phase = "resolve_principal", "resolving secondary concepts");
        for i in 0..self.names.len() {
            let id = ScientificNameId::from_index(i);
            let Some(principal) = self.scientific_name(id).principal() else {
                continue;
            };
            let secondary = self.resolver.secondary_concepts(self, id);
            for concept in &secondary {
                self.report(
                    IssueType::Note,
                    "taxonConcept.reallocated.secondary",
                    Some(principal.into()),
                    &[(*concept).into()],
                );
                self.reallocate_concept(*concept, principal, "taxonConcept.reallocated.secondary.provenance")?;
                self.count("count.reallocate.secondary");
            }
            self.names[i].remove_children(&secondary);
        }

        tracing::info!(phase = "resolve_principal", names = self.unranked.len(), "resolving principals for unranked names");
        let choices: Vec<Choice<ScientificNameId>> = (0..self.unranked.len())
            .into_par_iter()
            .map(|i| {
                let id = UnrankedNameId::from_index(i);
                let names = self.unranked_name(id).children().to_vec();
                self.choose_name(
                    id.into(),
                    names,
                    |sn| {
                        let name = self.scientific_name(sn);
                        name.rank() != Rank::Unranked && name.principal().is_some()
                    },
                    "unrankedScientificName.collision",
                )
            })
            .collect();
        for (i, choice) in choices.into_iter().enumerate() {
            let id = UnrankedNameId::from_index(i);
            self.report_principal(NameLevel::Unranked, id.into(), choice.principal.map(Into::into), choice.children.len());
            let name = &mut self.unranked[i];
            name.set_principal(choice.principal);
            name.set_children_order(choice.children);
            if let Some(principal) = choice.principal {
                self.reallocate_unranked_names(id, principal)?;
            }
        }

        tracing::info!(phase = "resolve_principal", names = self.bare.len(), "resolving principals for bare names");
        let choices: Vec<Choice<UnrankedNameId>> = (0..self.bare.len())
            .into_par_iter()
            .map(|i| {
                let id = BareNameId::from_index(i);
                let names = self.bare_name(id).children().to_vec();
                self.choose_name(
                    id.into(),
                    names,
                    |un| {
                        let name = self.unranked_name(un);
                        name.key().code().is_some() && name.principal().is_some()
                    },
                    "uncodedScientificName.collision",
                )
            })
            .collect();
        for (i, choice) in choices.into_iter().enumerate() {
            let id = BareNameId::from_index(i);
            self.report_principal(NameLevel::Bare, id.into(), choice.principal.map(Into::into), choice.children.len());
            let name = &mut self.bare[i];
            name.set_principal(choice.principal);
            name.set_children_order(choice.children);
            if let Some(principal) = choice.principal {
                self.reallocate_uncoded_names(id, principal)?;
            }
        }
        tracing::info!(phase = "resolve_principal", "resolved principals");
        Ok(())
    }

    /// Unauthored accepted concepts fold into the principal. Authored ones
    /// get inferred synonyms instead, provided the principal is owned.
    fn reallocate_dangling_concepts(&mut self, name: ScientificNameId, principal: ConceptId) -> Result<()> {
        let accepted: Vec<ConceptId> = self
            .scientific_name(name)
            .children()
            .iter()
            .copied()
            .filter(|c| {
                let tc = self.concept(*c);
                tc.is_formal() && tc.has_accepted(&self.instances)
            })
            .collect();
        let owned = self.is_owned(principal);
        let mut reallocated = Vec::new();
        for concept in accepted {
            if concept == principal || self.is_owned(concept) {
                continue;
            }
            let authored = self.concept(concept).is_authored();
            if authored && owned {
                self.add_inferred_synonym(concept, principal)?;
            } else if !authored {
                self.reallocate_concept(concept, principal, "taxonConcept.reallocated.provenance")?;
                reallocated.push(concept);
            }
        }
        self.names[name.index()].remove_children(&reallocated);
        self.count("count.resolve.scientificName.principal");
        Ok(())
    }

    /// Move every concept of `element` into the principal concept of `target`.
    fn reallocate_scientific_name(&mut self, element: ScientificNameId, target: ScientificNameId, reason: &str) -> Result<()> {
        self.report(IssueType::Note, "scientificName.reallocated", Some(element.into()), &[target.into()]);
        self.count("count.reallocate.scientificName");
        let Some(principal) = self.scientific_name(target).principal() else {
            return Err(TaxonomyError::Reallocation {
                element: self.describe(element.into()),
                target: self.describe(target.into()),
            });
        };
        let concepts = self.scientific_name(element).children().to_vec();
        for concept in concepts {
            if !self.concept(concept).is_cleared() {
                self.reallocate_concept(concept, principal, reason)?;
            }
        }
        self.names[element.index()].clear(Some(principal));
        Ok(())
    }

    fn reallocate_unranked_names(&mut self, name: UnrankedNameId, principal: ScientificNameId) -> Result<()> {
        let unranked: Vec<ScientificNameId> = self
            .unranked_name(name)
            .children()
            .iter()
            .copied()
            .filter(|sn| *sn != principal && self.scientific_name(*sn).rank() == Rank::Unranked)
            .collect();
        for sn in &unranked {
            self.report(IssueType::Note, "unrankedScientificName.reallocated", Some((*sn).into()), &[principal.into()]);
            self.count("count.reallocate.unrankedScientificName");
            self.reallocate_scientific_name(*sn, principal, "unrankedScientificName.reallocated.provenance")?;
        }
        self.unranked[name.index()].remove_children(&unranked);
        self.count("count.resolve.unrankedScientificName.principal");
        Ok(())
    }

    fn reallocate_uncoded_names(&mut self, name: BareNameId, principal: UnrankedNameId) -> Result<()> {
        let uncoded: Vec<UnrankedNameId> = self
            .bare_name(name)
            .children()
            .iter()
            .copied()
            .filter(|un| *un != principal && self.unranked_name(*un).key().code().is_none())
            .collect();
        for un in &uncoded {
            self.report(IssueType::Note, "uncodedScientificName.reallocated", Some((*un).into()), &[principal.into()]);
            self.count("count.reallocate.uncodedScientificName");
            let Some(target) = self.unranked_name(principal).principal() else {
                return Err(TaxonomyError::Reallocation {
                    element: self.describe((*un).into()),
                    target: self.describe(principal.into()),
                });
            };
            let names = self.unranked_name(*un).children().to_vec();
            for sn in names {
                if sn != target && !self.scientific_name(sn).is_cleared() {
                    self.reallocate_scientific_name(sn, target, "uncodedScientificName.reallocated.provenance")?;
                }
            }
            self.unranked[un.index()].clear(Some(target));
        }
        self.bare[name.index()].remove_children(&uncoded);
        self.count("count.resolve.uncodedScientificName.principal");
        Ok(())
    }
}
