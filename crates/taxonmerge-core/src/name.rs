//! The name hierarchy above taxon concepts.
//!
//! ```text
//!   BareName               "CANIS LUPUS"                     (no code, no rank, no author)
//!     └── UnrankedScientificName  ICZN "CANIS LUPUS"          (no rank, no author)
//!           └── ScientificName    ICZN "CANIS LUPUS" species  (no author)
//!                 └── TaxonConcept ICZN "CANIS LUPUS" species "Linnaeus, 1758"
//! ```
//!
//! All three name levels share one shape: an ordered child list, a key map
//! and an optional principal child chosen during principal resolution.

use crate::element::{BareNameId, ConceptId, ScientificNameId, UnrankedNameId};
use ahash::AHashMap;
use taxonmerge_model::{NameKey, Rank};

#[derive(Debug, Clone)]
pub struct NameNode<P, C> {
    key: NameKey,
    container: Option<P>,
    children: Vec<C>,
    child_map: AHashMap<NameKey, C>,
    principal: Option<C>,
    cleared: bool,
}

/// Concepts sharing code, name and rank.
pub type ScientificName = NameNode<UnrankedNameId, ConceptId>;
/// Scientific names sharing code and name.
pub type UnrankedScientificName = NameNode<BareNameId, ScientificNameId>;
/// Unranked names sharing a name, whatever the code.
pub type BareName = NameNode<BareNameId, UnrankedNameId>;

/// Which level of the hierarchy a name lives at. Used for issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLevel {
    Scientific,
    Unranked,
    Bare,
}

impl NameLevel {
    pub fn label(self) -> &'static str {
        match self {
            NameLevel::Scientific => "ScientificName",
            NameLevel::Unranked => "UnrankedScientificName",
            NameLevel::Bare => "BareName",
        }
    }
}

impl<P: Copy, C: Copy + PartialEq> NameNode<P, C> {
    pub fn new(key: NameKey, container: Option<P>) -> Self {
        Self {
            key,
            container,
            children: Vec::new(),
            child_map: AHashMap::new(),
            principal: None,
            cleared: false,
        }
    }

    pub fn key(&self) -> &NameKey {
        &self.key
    }

    pub fn rank(&self) -> Rank {
        self.key.rank()
    }

    pub fn container(&self) -> Option<P> {
        self.container
    }

    pub fn children(&self) -> &[C] {
        &self.children
    }

    pub fn child(&self, key: &NameKey) -> Option<C> {
        self.child_map.get(key).copied()
    }

    pub fn principal(&self) -> Option<C> {
        self.principal
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub(crate) fn add_child(&mut self, key: NameKey, child: C) {
        if self.child_map.insert(key, child).is_none() {
            self.children.push(child);
        }
    }

    pub(crate) fn set_principal(&mut self, principal: Option<C>) {
        self.principal = principal;
    }

    /// Reorder children. The key map is unaffected.
    pub(crate) fn set_children_order(&mut self, children: Vec<C>) {
        self.children = children;
    }

    pub(crate) fn remove_children(&mut self, remove: &[C]) {
        if remove.is_empty() {
            return;
        }
        self.children.retain(|c| !remove.contains(c));
        self.child_map.retain(|_, c| !remove.contains(c));
        if self.principal.map(|p| remove.contains(&p)).unwrap_or(false) {
            self.principal = None;
        }
    }

    /// Drop every child after reallocation, keeping a principal to forward to.
    pub(crate) fn clear(&mut self, principal: Option<C>) {
        self.children.clear();
        self.child_map.clear();
        self.principal = principal;
        self.cleared = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxonmerge_model::{AuthorComparator, NameType, NomenclaturalCode};

    fn key(name: &str) -> NameKey {
        NameKey::new(
            &AuthorComparator::default(),
            Some(NomenclaturalCode::Botanical),
            name,
            None,
            Rank::Species,
            NameType::Scientific,
            Default::default(),
        )
    }

    #[test]
    fn children_are_unique_by_key() {
        let mut sn: ScientificName = NameNode::new(key("ACACIA DEALBATA"), None);
        sn.add_child(key("ACACIA DEALBATA"), ConceptId::from_index(0));
        sn.add_child(key("ACACIA DEALBATA"), ConceptId::from_index(1));
        assert_eq!(sn.children(), &[ConceptId::from_index(0)]);
    }

    #[test]
    fn removing_the_principal_unsets_it() {
        let mut sn: ScientificName = NameNode::new(key("ACACIA"), None);
        sn.add_child(key("A"), ConceptId::from_index(0));
        sn.add_child(key("B"), ConceptId::from_index(1));
        sn.set_principal(Some(ConceptId::from_index(1)));
        sn.remove_children(&[ConceptId::from_index(1)]);
        assert_eq!(sn.principal(), None);
        assert_eq!(sn.child(&key("B")), None);
        sn.clear(Some(ConceptId::from_index(7)));
        assert!(sn.is_cleared());
        assert!(sn.children().is_empty());
        assert_eq!(sn.principal(), Some(ConceptId::from_index(7)));
    }
}
