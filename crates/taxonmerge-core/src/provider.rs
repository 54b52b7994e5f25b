//! Name providers.
//!
//! Providers form a tree. Every inheritable setting is looked up by walking
//! from a provider towards the root until a value is found, with a system
//! default at the end of the chain.
//!
//! ```text
//!   default (score 100, unknown taxon)
//!     ├── afd            inherits unknown taxon, owns "Canis"
//!     └── ala-extra      loose, score 50
//! ```

use crate::condition::MatchContext;
use crate::config::ProviderConfig;
use crate::element::ProviderId;
use crate::error::{Result, TaxonomyError};
use crate::instance::TaxonConceptInstance;
use crate::score::clamp_score;
use crate::DEFAULT_SCORE;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use taxonmerge_model::{NameKey, NomenclaturalCode, Rank, TaxonomicType};

// ============================================================================
// Strategies
// ============================================================================

/// What to do with an instance once it has been forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscardStrategy {
    /// Leave it out of the output.
    #[default]
    Ignore,
    /// Record the taxon id as an extra identifier of the nearest parent.
    IdentifierToParent,
    /// Turn it into an inferred synonym of the nearest parent.
    SynonymiseToParent,
}

/// Which unranked instances may be moved onto a ranked concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnrankedStrategy {
    AllInfer,
    All,
    InferredAndSynonymsInfer,
    InferredAndSynonyms,
    SynonymsInfer,
    Synonyms,
    #[default]
    None,
}

const INFERRED: &[TaxonomicType] = &[
    TaxonomicType::InferredUnplaced,
    TaxonomicType::InferredSynonym,
    TaxonomicType::InferredAccepted,
];

impl UnrankedStrategy {
    /// Fall back to guessing the rank from the shape of the name.
    pub fn infer_rank(self) -> bool {
        matches!(
            self,
            UnrankedStrategy::AllInfer
                | UnrankedStrategy::InferredAndSynonymsInfer
                | UnrankedStrategy::SynonymsInfer
        )
    }

    pub fn reassigns(self, status: TaxonomicType) -> bool {
        match self {
            UnrankedStrategy::AllInfer | UnrankedStrategy::All => true,
            UnrankedStrategy::InferredAndSynonymsInfer | UnrankedStrategy::InferredAndSynonyms => {
                INFERRED.contains(&status) || TaxonomicType::SYNONYMS.contains(&status)
            }
            UnrankedStrategy::SynonymsInfer | UnrankedStrategy::Synonyms => {
                TaxonomicType::SYNONYMS.contains(&status)
            }
            UnrankedStrategy::None => false,
        }
    }

    pub fn is_reassignable(self, instance: &TaxonConceptInstance) -> bool {
        !instance.forbidden && instance.rank == Rank::Unranked && self.reassigns(instance.status)
    }
}

/// How strongly a provider's concepts hold their ground against other
/// concepts with the same scientific name. Earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ConceptResolutionPriority {
    #[default]
    #[serde(rename = "AUTHORATATIVE", alias = "AUTHORITATIVE")]
    Authoritative,
    #[serde(rename = "ADDITIONAL")]
    Additional,
    #[serde(rename = "FILLER")]
    Filler,
}

// ============================================================================
// Providers
// ============================================================================

#[derive(Debug, Clone)]
pub struct NameProvider {
    config: ProviderConfig,
    parent: Option<ProviderId>,
}

impl NameProvider {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(&self.config.id)
    }

    pub fn parent(&self) -> Option<ProviderId> {
        self.parent
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_loose(&self) -> bool {
        self.config.loose
    }

    pub fn is_external(&self) -> bool {
        self.config.external
    }

    /// Owned names are not inherited.
    pub fn owns(&self, name: &str) -> bool {
        self.config.owner.contains(name)
    }
}

/// Arena of providers with lookup by id and dataset name.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<NameProvider>,
    by_key: AHashMap<String, ProviderId>,
    default_provider: ProviderId,
    inference_provider: ProviderId,
}

impl ProviderRegistry {
    /// Build from validated configuration.
    pub fn new(configs: &[ProviderConfig], default_provider: &str, inference_provider: &str) -> Result<Self> {
        let mut by_key = AHashMap::with_capacity(configs.len());
        for (i, c) in configs.iter().enumerate() {
            by_key.insert(c.id.clone(), ProviderId::from_index(i));
        }
        let mut providers = Vec::with_capacity(configs.len());
        for c in configs {
            let parent = match &c.parent {
                Some(p) => Some(
                    *by_key
                        .get(p)
                        .ok_or_else(|| TaxonomyError::UnknownProvider(p.clone()))?,
                ),
                None => None,
            };
            providers.push(NameProvider {
                config: c.clone(),
                parent,
            });
        }
        let lookup = |id: &str| {
            by_key
                .get(id)
                .copied()
                .ok_or_else(|| TaxonomyError::UnknownProvider(id.to_string()))
        };
        let default_provider = lookup(default_provider)?;
        let inference_provider = lookup(inference_provider)?;
        Ok(Self {
            providers,
            by_key,
            default_provider,
            inference_provider,
        })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn get(&self, id: ProviderId) -> &NameProvider {
        &self.providers[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = ProviderId> + '_ {
        (0..self.providers.len()).map(ProviderId::from_index)
    }

    pub fn lookup(&self, key: &str) -> Option<ProviderId> {
        self.by_key.get(key).copied()
    }

    pub fn default_provider(&self) -> ProviderId {
        self.default_provider
    }

    pub fn inference_provider(&self) -> ProviderId {
        self.inference_provider
    }

    /// Add a provider discovered in the data. Registered under its id and,
    /// if different, its name.
    pub(crate) fn insert(&mut self, config: ProviderConfig) -> ProviderId {
        let id = ProviderId::from_index(self.providers.len());
        let parent = config.parent.as_deref().and_then(|p| self.lookup(p));
        self.by_key.insert(config.id.clone(), id);
        if let Some(name) = &config.name {
            self.by_key.entry(name.clone()).or_insert(id);
        }
        self.providers.push(NameProvider { config, parent });
        id
    }

    /// The provider followed by its ancestors. Bounded by the registry size.
    pub fn chain(&self, id: ProviderId) -> impl Iterator<Item = &NameProvider> + '_ {
        let mut current = Some(id);
        let mut remaining = self.providers.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let provider = self.get(current?);
            current = provider.parent;
            Some(provider)
        })
    }

    fn inherited<T>(&self, id: ProviderId, get: impl Fn(&ProviderConfig) -> Option<T>) -> Option<T> {
        self.chain(id).find_map(|p| get(&p.config))
    }

    /// The provider itself when it is an authority, otherwise the nearest
    /// authoritative ancestor. A chain with no authority at all ends at its
    /// root provider, which then stands in as the authority.
    pub fn authority(&self, id: ProviderId) -> ProviderId {
        let mut current = id;
        for _ in 0..self.providers.len() {
            let p = self.get(current);
            if p.config.authority {
                return current;
            }
            match p.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
        current
    }

    pub fn discard_strategy(&self, id: ProviderId) -> DiscardStrategy {
        self.inherited(id, |c| c.discard_strategy).unwrap_or_default()
    }

    pub fn unranked_strategy(&self, id: ProviderId) -> UnrankedStrategy {
        self.inherited(id, |c| c.unranked_strategy).unwrap_or_default()
    }

    pub fn concept_resolution_priority(&self, id: ProviderId) -> ConceptResolutionPriority {
        self.inherited(id, |c| c.concept_resolution_priority)
            .unwrap_or_default()
    }

    pub fn unknown_taxon_id(&self, id: ProviderId) -> Option<&str> {
        self.chain(id)
            .find_map(|p| p.config.unknown_taxon_id.as_deref())
    }

    pub fn default_parent_taxon(&self, id: ProviderId) -> Option<&str> {
        self.chain(id)
            .find_map(|p| p.config.default_parent_taxon.as_deref())
    }

    pub fn default_score(&self, id: ProviderId) -> i32 {
        clamp_score(self.inherited(id, |c| c.default_score).unwrap_or(DEFAULT_SCORE) as i64)
    }

    pub fn default_code(&self, id: ProviderId) -> Option<NomenclaturalCode> {
        self.inherited(id, |c| c.default_code)
    }

    pub fn specific_score(&self, id: ProviderId, name: &str) -> Option<i32> {
        self.inherited(id, |c| c.scores.get(name).copied())
            .map(|s| clamp_score(s as i64))
    }

    pub fn owns(&self, id: ProviderId, name: &str) -> bool {
        self.get(id).owns(name)
    }

    pub fn correct_scientific_name<'a>(&'a self, id: ProviderId, name: &'a str) -> &'a str {
        self.chain(id)
            .find_map(|p| p.config.name_changes.get(name).map(String::as_str))
            .unwrap_or(name)
    }

    pub fn correct_author<'a>(&'a self, id: ProviderId, author: Option<&'a str>) -> Option<&'a str> {
        let author = author?;
        Some(
            self.chain(id)
                .find_map(|p| p.config.author_changes.get(author).map(String::as_str))
                .unwrap_or(author),
        )
    }

    fn root_first(&self, id: ProviderId) -> Vec<&NameProvider> {
        let mut chain: Vec<&NameProvider> = self.chain(id).collect();
        chain.reverse();
        chain
    }

    /// Explanation of why the instance is forbidden. Ancestors are asked first.
    pub fn forbid(&self, id: ProviderId, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> Option<String> {
        self.root_first(id)
            .into_iter()
            .find_map(|p| p.config.adjuster.forbid(instance, ctx))
    }

    /// Apply score adjustments, ancestors first. Not clamped.
    pub fn adjust_score(&self, id: ProviderId, score: i64, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> i64 {
        self.root_first(id)
            .into_iter()
            .fold(score, |s, p| p.config.adjuster.score(s, instance, ctx))
    }

    /// Apply key adjustments, ancestors first.
    pub fn adjust_key(&self, id: ProviderId, key: NameKey, instance: &TaxonConceptInstance, ctx: &MatchContext<'_>) -> NameKey {
        self.root_first(id)
            .into_iter()
            .fold(key, |k, p| p.config.key_adjuster.adjust(k, instance, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let configs = vec![
            ProviderConfig::new("root", 100)
                .with_discard(DiscardStrategy::IdentifierToParent)
                .with_name_score("Canis", 500),
            ProviderConfig::child("afd", "root")
                .with_score(80)
                .owning("Canis lupus"),
            ProviderConfig::child("extra", "afd")
                .with_priority(ConceptResolutionPriority::Filler)
                .non_authority(),
        ];
        ProviderRegistry::new(&configs, "root", "root").unwrap()
    }

    #[test]
    fn settings_inherit_along_the_chain() {
        let reg = registry();
        let extra = reg.lookup("extra").unwrap();
        let afd = reg.lookup("afd").unwrap();
        assert_eq!(reg.default_score(extra), 80);
        assert_eq!(reg.discard_strategy(extra), DiscardStrategy::IdentifierToParent);
        assert_eq!(reg.specific_score(extra, "Canis"), Some(500));
        assert_eq!(reg.unknown_taxon_id(extra), Some(crate::DEFAULT_UNKNOWN_TAXON_ID));
        assert_eq!(reg.concept_resolution_priority(afd), ConceptResolutionPriority::Authoritative);
        assert_eq!(reg.concept_resolution_priority(extra), ConceptResolutionPriority::Filler);
        assert_eq!(reg.unranked_strategy(extra), UnrankedStrategy::None);
    }

    #[test]
    fn ownership_is_not_inherited() {
        let reg = registry();
        assert!(reg.owns(reg.lookup("afd").unwrap(), "Canis lupus"));
        assert!(!reg.owns(reg.lookup("extra").unwrap(), "Canis lupus"));
    }

    #[test]
    fn non_authorities_defer_to_their_parent() {
        let reg = registry();
        let extra = reg.lookup("extra").unwrap();
        assert_eq!(reg.authority(extra), reg.lookup("afd").unwrap());
    }

    #[test]
    fn chain_without_authority_falls_back_to_the_root() {
        let configs = vec![
            ProviderConfig::new("root", 100).non_authority(),
            ProviderConfig::child("col", "root").non_authority(),
        ];
        let reg = ProviderRegistry::new(&configs, "root", "root").unwrap();
        let col = reg.lookup("col").unwrap();
        assert_eq!(reg.authority(col), reg.lookup("root").unwrap());
    }

    #[test]
    fn priority_order_favours_authoritative() {
        assert!(ConceptResolutionPriority::Authoritative < ConceptResolutionPriority::Additional);
        assert!(ConceptResolutionPriority::Additional < ConceptResolutionPriority::Filler);
        let p: ConceptResolutionPriority = serde_json::from_str("\"AUTHORATATIVE\"").unwrap();
        assert_eq!(p, ConceptResolutionPriority::Authoritative);
    }

    #[test]
    fn synonym_strategy_skips_misapplied() {
        assert!(UnrankedStrategy::Synonyms.reassigns(TaxonomicType::HeterotypicSynonym));
        assert!(!UnrankedStrategy::Synonyms.reassigns(TaxonomicType::Misapplied));
        assert!(!UnrankedStrategy::Synonyms.reassigns(TaxonomicType::InferredAccepted));
        assert!(UnrankedStrategy::InferredAndSynonyms.reassigns(TaxonomicType::InferredAccepted));
        assert!(UnrankedStrategy::All.reassigns(TaxonomicType::Misapplied));
        assert!(!UnrankedStrategy::None.reassigns(TaxonomicType::Synonym));
        assert!(UnrankedStrategy::SynonymsInfer.infer_rank());
    }
}
