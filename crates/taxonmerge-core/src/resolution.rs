//! The resolution of a taxon concept.
//!
//! A resolution maps every instance of a concept onto the instance that
//! represents it in the output. `principal` is the starting set chosen by the
//! resolver; `used` grows as instances that match nothing already used are
//! mapped onto themselves.

use crate::distribution::Distribution;
use crate::element::InstanceId;
use ahash::AHashMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TaxonResolution {
    principal: Vec<InstanceId>,
    used: Vec<InstanceId>,
    map: BTreeMap<InstanceId, InstanceId>,
    distributions: AHashMap<InstanceId, Option<Vec<Distribution>>>,
}

impl TaxonResolution {
    pub fn new(principal: Vec<InstanceId>) -> Self {
        Self {
            used: principal.clone(),
            principal,
            map: BTreeMap::new(),
            distributions: AHashMap::new(),
        }
    }

    pub fn principal(&self) -> &[InstanceId] {
        &self.principal
    }

    pub fn used(&self) -> &[InstanceId] {
        &self.used
    }

    pub fn is_principal(&self, id: InstanceId) -> bool {
        self.principal.contains(&id)
    }

    /// Map onto an instance of this concept, which becomes used.
    /// Returns true when `resolved` was not used before.
    pub fn add_internal(&mut self, instance: InstanceId, resolved: InstanceId) -> bool {
        let added = !self.used.contains(&resolved);
        if added {
            self.used.push(resolved);
        }
        self.map.insert(instance, resolved);
        added
    }

    /// Map onto an instance that lives elsewhere.
    pub fn add_external(&mut self, instance: InstanceId, resolved: InstanceId) {
        self.map.insert(instance, resolved);
    }

    pub fn resolved(&self, instance: InstanceId) -> Option<InstanceId> {
        self.map.get(&instance).copied()
    }

    /// Instances mapped onto `instance`, in id order.
    pub fn children(&self, instance: InstanceId) -> Vec<InstanceId> {
        self.map
            .iter()
            .filter(|(_, r)| **r == instance)
            .map(|(i, _)| *i)
            .collect()
    }

    pub fn mapping(&self) -> impl Iterator<Item = (InstanceId, InstanceId)> + '_ {
        self.map.iter().map(|(i, r)| (*i, *r))
    }

    pub fn distribution(&self, instance: InstanceId) -> Option<&[Distribution]> {
        self.distributions
            .get(&instance)
            .and_then(|d| d.as_deref())
    }

    pub fn set_distribution(&mut self, instance: InstanceId, distribution: Option<Vec<Distribution>>) {
        self.distributions.insert(instance, distribution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> InstanceId {
        InstanceId::from_index(i)
    }

    #[test]
    fn internal_mapping_grows_used() {
        let mut r = TaxonResolution::new(vec![id(0)]);
        assert!(!r.add_internal(id(0), id(0)));
        assert!(r.add_internal(id(1), id(1)));
        r.add_internal(id(2), id(1));
        r.add_external(id(3), id(9));
        assert_eq!(r.used(), &[id(0), id(1)]);
        assert_eq!(r.children(id(1)), vec![id(1), id(2)]);
        assert_eq!(r.resolved(id(3)), Some(id(9)));
        assert_eq!(r.resolved(id(4)), None);
        assert!(r.is_principal(id(0)));
    }
}
