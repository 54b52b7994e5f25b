//! Taxon concepts: every instance that shares a full name key.
//!
//! A concept only holds ids. Anything that needs to look at the instances
//! themselves takes the instance arena as an argument, so the concept can be
//! borrowed alongside the rest of the [`Taxonomy`](crate::Taxonomy).

use crate::element::{ConceptId, InstanceId, ProviderId, ScientificNameId};
use crate::instance::TaxonConceptInstance;
use crate::resolution::TaxonResolution;
use crate::vernacular::VernacularName;
use std::cmp::Ordering;
use std::fmt;
use taxonmerge_model::{NameKey, Rank};

#[derive(Debug, Clone)]
pub struct TaxonConcept {
    key: NameKey,
    container: ScientificNameId,
    pub(crate) instances: Vec<InstanceId>,
    pub(crate) resolution: Option<TaxonResolution>,
    pub(crate) cleared: bool,
    pub(crate) preferred: Option<VernacularName>,
}

/// Ordering used to pick the rank of a resolved concept. Primary beats
/// non-primary, accepted beats non-accepted, then the rank nearest the leaves.
fn rank_order(a: &TaxonConceptInstance, b: &TaxonConceptInstance) -> Ordering {
    a.is_primary()
        .cmp(&b.is_primary())
        .then(a.is_accepted().cmp(&b.is_accepted()))
        .then(a.rank.sort_order().cmp(&b.rank.sort_order()))
}

impl TaxonConcept {
    pub fn new(key: NameKey, container: ScientificNameId) -> Self {
        Self {
            key,
            container,
            instances: Vec::new(),
            resolution: None,
            cleared: false,
            preferred: None,
        }
    }

    pub fn key(&self) -> &NameKey {
        &self.key
    }

    pub fn container(&self) -> ScientificNameId {
        self.container
    }

    pub fn instances(&self) -> &[InstanceId] {
        &self.instances
    }

    pub fn resolution(&self) -> Option<&TaxonResolution> {
        self.resolution.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Reallocated into another concept.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn preferred(&self) -> Option<&VernacularName> {
        self.preferred.as_ref()
    }

    pub fn principals(&self) -> Option<&[InstanceId]> {
        self.resolution.as_ref().map(TaxonResolution::principal)
    }

    /// The used instances once resolved, otherwise every instance.
    pub fn used(&self) -> &[InstanceId] {
        match &self.resolution {
            Some(r) => r.used(),
            None => &self.instances,
        }
    }

    /// Unresolved concepts map every instance onto itself.
    pub fn get_resolved(&self, instance: InstanceId) -> Option<InstanceId> {
        match &self.resolution {
            Some(r) => r.resolved(instance),
            None => Some(instance),
        }
    }

    /// The first accepted used instance, or the first used instance.
    pub fn representative(&self, arena: &[TaxonConceptInstance]) -> Option<InstanceId> {
        let used = self.used();
        used.iter()
            .copied()
            .find(|id| arena[id.index()].is_accepted())
            .or_else(|| used.first().copied())
    }

    pub fn has_accepted(&self, arena: &[TaxonConceptInstance]) -> bool {
        match &self.resolution {
            Some(r) => r.principal().iter().any(|id| arena[id.index()].is_accepted()),
            None => self.instances.iter().any(|id| {
                let tci = &arena[id.index()];
                tci.is_accepted() && !tci.forbidden
            }),
        }
    }

    pub fn rank(&self, arena: &[TaxonConceptInstance]) -> Rank {
        let Some(resolution) = &self.resolution else {
            return self.key.rank();
        };
        resolution
            .principal()
            .iter()
            .map(|id| &arena[id.index()])
            .max_by(|a, b| rank_order(a, b))
            .map(|tci| tci.rank)
            .unwrap_or_else(|| self.key.rank())
    }

    /// First non-forbidden instance from a provider.
    pub fn find_instance(
        &self,
        arena: &[TaxonConceptInstance],
        provider: ProviderId,
        accepted_only: bool,
    ) -> Option<InstanceId> {
        self.instances.iter().copied().find(|id| {
            let tci = &arena[id.index()];
            tci.provider == provider && !tci.forbidden && (!accepted_only || tci.is_accepted())
        })
    }

    pub fn is_formal(&self) -> bool {
        self.key.is_formal()
    }

    pub fn is_authored(&self) -> bool {
        !self.key.is_unauthored()
    }

    pub fn is_autonym(&self) -> bool {
        self.key.is_autonym()
    }

    /// Replaces any instance with the same taxon id.
    pub(crate) fn add_instance(&mut self, arena: &[TaxonConceptInstance], id: InstanceId) {
        let taxon_id = &arena[id.index()].taxon_id;
        self.instances
            .retain(|i| *i == id || arena.get(i.index()).map(|t| &t.taxon_id) != Some(taxon_id));
        if !self.instances.contains(&id) {
            self.instances.push(id);
        }
    }

    pub fn describe(&self, id: ConceptId, arena: &[TaxonConceptInstance]) -> String {
        Described {
            id,
            concept: self,
            arena,
        }
        .to_string()
    }
}

struct Described<'a> {
    id: ConceptId,
    concept: &'a TaxonConcept,
    arena: &'a [TaxonConceptInstance],
}

impl fmt::Display for Described<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = &self.concept.key;
        write!(
            f,
            "TC#{}[{}, {}, {}, {}",
            self.id.index(),
            key.code().map(|c| c.acronym()).unwrap_or("no code"),
            key.name(),
            key.author().unwrap_or("-"),
            key.rank()
        )?;
        if let Some(rep) = self.concept.representative(self.arena) {
            write!(f, " = {}", self.arena[rep.index()].taxon_id)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxonmerge_model::{AuthorComparator, NameType, NomenclaturalCode, TaxonomicType};

    fn key(author: Option<&str>) -> NameKey {
        NameKey::new(
            &AuthorComparator::default(),
            Some(NomenclaturalCode::Zoological),
            "CANIS LUPUS",
            author.map(str::to_string),
            Rank::Species,
            NameType::Scientific,
            Default::default(),
        )
    }

    fn tci(id: &str, status: TaxonomicType) -> TaxonConceptInstance {
        TaxonConceptInstance::new(
            id,
            ProviderId::from_index(0),
            Some(NomenclaturalCode::Zoological),
            "Canis lupus",
            status,
            Rank::Species,
        )
    }

    #[test]
    fn representative_prefers_accepted() {
        let arena = vec![tci("s", TaxonomicType::Synonym), tci("a", TaxonomicType::Accepted)];
        let mut tc = TaxonConcept::new(key(Some("L.")), ScientificNameId::from_index(0));
        tc.add_instance(&arena, InstanceId::from_index(0));
        tc.add_instance(&arena, InstanceId::from_index(1));
        assert_eq!(tc.representative(&arena), Some(InstanceId::from_index(1)));
        assert!(tc.has_accepted(&arena));
        assert!(tc.is_authored());
        assert_eq!(tc.get_resolved(InstanceId::from_index(0)), Some(InstanceId::from_index(0)));
    }

    #[test]
    fn adding_the_same_taxon_id_replaces() {
        let arena = vec![tci("a", TaxonomicType::Accepted), tci("a", TaxonomicType::Accepted)];
        let mut tc = TaxonConcept::new(key(None), ScientificNameId::from_index(0));
        tc.add_instance(&arena, InstanceId::from_index(0));
        tc.add_instance(&arena, InstanceId::from_index(1));
        assert_eq!(tc.instances(), &[InstanceId::from_index(1)]);
    }

    #[test]
    fn resolved_rank_comes_from_principals() {
        let mut arena = vec![tci("a", TaxonomicType::Accepted), tci("b", TaxonomicType::Synonym)];
        arena[1].rank = Rank::Subspecies;
        let mut tc = TaxonConcept::new(key(None), ScientificNameId::from_index(0));
        tc.resolution = Some(TaxonResolution::new(vec![
            InstanceId::from_index(1),
            InstanceId::from_index(0),
        ]));
        assert_eq!(tc.rank(&arena), Rank::Species);
    }
}
