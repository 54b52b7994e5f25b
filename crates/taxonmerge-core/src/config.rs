//! Taxonomy configuration.
//!
//! A configuration is a JSON document listing providers and the few global
//! settings the engine needs. Provider settings are optional and inherit
//! along the `parent` chain; see [`ProviderRegistry`](crate::provider::ProviderRegistry).

use crate::condition::{KeyAdjuster, ScoreAdjuster, ScoreAdjustment, TaxonCondition};
use crate::error::{Result, TaxonomyError};
use crate::provider::{ConceptResolutionPriority, DiscardStrategy, UnrankedStrategy};
use crate::{DEFAULT_SCORE, DEFAULT_UNKNOWN_TAXON_ID};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use taxonmerge_model::NomenclaturalCode;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxonomyConfiguration {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub providers: Vec<ProviderConfig>,
    pub default_provider: String,
    /// Provider credited with inferred taxa. Defaults to the default provider.
    pub inference_provider: Option<String>,
    /// Instances must score above this to be considered accepted.
    pub accepted_cutoff: i32,
    /// Extra author abbreviations, abbreviation → expansion.
    pub author_map: BTreeMap<String, String>,
    /// Whole-name patterns that mark a name as informal.
    pub informal_patterns: Vec<String>,
}

impl Default for TaxonomyConfiguration {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "New taxonomy configuration".to_string(),
            description: None,
            providers: vec![ProviderConfig::new("default", DEFAULT_SCORE)],
            default_provider: "default".to_string(),
            inference_provider: None,
            accepted_cutoff: 0,
            author_map: BTreeMap::new(),
            informal_patterns: Vec::new(),
        }
    }
}

impl TaxonomyConfiguration {
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config = Self::read(BufReader::new(File::open(path)?))?;
        tracing::info!(path = %path.display(), providers = config.providers.len(), "loaded configuration");
        Ok(config)
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn inference_provider_id(&self) -> &str {
        self.inference_provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Check provider references and the shape of the provider tree.
    pub fn validate(&self) -> Result<()> {
        let mut ids = AHashSet::new();
        for p in &self.providers {
            if p.id.trim().is_empty() {
                return Err(TaxonomyError::Configuration("provider with empty id".into()));
            }
            if !ids.insert(p.id.as_str()) {
                return Err(TaxonomyError::Configuration(format!(
                    "duplicate provider {}",
                    p.id
                )));
            }
        }
        if !ids.contains(self.default_provider.as_str()) {
            return Err(TaxonomyError::Configuration(
                "default provider not in provider list".into(),
            ));
        }
        if !ids.contains(self.inference_provider_id()) {
            return Err(TaxonomyError::Configuration(
                "inference provider not in provider list".into(),
            ));
        }
        let parents: AHashMap<&str, &str> = self
            .providers
            .iter()
            .filter_map(|p| p.parent.as_deref().map(|parent| (p.id.as_str(), parent)))
            .collect();
        for (child, parent) in &parents {
            if !ids.contains(parent) {
                return Err(TaxonomyError::Configuration(format!(
                    "provider {} has unknown parent {}",
                    child, parent
                )));
            }
        }
        for p in &self.providers {
            let mut seen = AHashSet::new();
            let mut current = Some(p.id.as_str());
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(TaxonomyError::Configuration(format!(
                        "provider {} has a parent loop",
                        p.id
                    )));
                }
                current = parents.get(id).copied();
            }
        }
        Ok(())
    }
}

/// One provider. Unset options inherit from the parent provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub default_score: Option<i32>,
    /// Scores for specific scientific names.
    pub scores: BTreeMap<String, i32>,
    /// Scientific names this provider is the owner of.
    pub owner: BTreeSet<String>,
    pub adjuster: ScoreAdjuster,
    pub key_adjuster: KeyAdjuster,
    pub default_code: Option<NomenclaturalCode>,
    /// Loose providers have loosely structured names and may lack parents.
    pub loose: bool,
    pub external: bool,
    /// Authority providers compete for principal instances in their own right.
    pub authority: bool,
    pub discard_strategy: Option<DiscardStrategy>,
    pub unranked_strategy: Option<UnrankedStrategy>,
    pub concept_resolution_priority: Option<ConceptResolutionPriority>,
    #[serde(rename = "unknownTaxonID")]
    pub unknown_taxon_id: Option<String>,
    pub default_parent_taxon: Option<String>,
    /// Scientific name spelling corrections, applied before analysis.
    pub name_changes: BTreeMap<String, String>,
    pub author_changes: BTreeMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: None,
            description: None,
            parent: None,
            default_score: None,
            scores: BTreeMap::new(),
            owner: BTreeSet::new(),
            adjuster: ScoreAdjuster::default(),
            key_adjuster: KeyAdjuster::default(),
            default_code: None,
            loose: false,
            external: true,
            authority: true,
            discard_strategy: None,
            unranked_strategy: None,
            concept_resolution_priority: None,
            unknown_taxon_id: None,
            default_parent_taxon: None,
            name_changes: BTreeMap::new(),
            author_changes: BTreeMap::new(),
        }
    }
}

impl ProviderConfig {
    /// A root provider with its own score and the default unknown taxon.
    pub fn new(id: impl Into<String>, default_score: i32) -> Self {
        Self {
            id: id.into(),
            default_score: Some(default_score),
            unknown_taxon_id: Some(DEFAULT_UNKNOWN_TAXON_ID.to_string()),
            ..Self::default()
        }
    }

    /// A provider that inherits everything from `parent`.
    pub fn child(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.default_score = Some(score);
        self
    }

    pub fn with_name_score(mut self, name: impl Into<String>, score: i32) -> Self {
        self.scores.insert(name.into(), score);
        self
    }

    pub fn owning(mut self, name: impl Into<String>) -> Self {
        self.owner.insert(name.into());
        self
    }

    pub fn with_discard(mut self, strategy: DiscardStrategy) -> Self {
        self.discard_strategy = Some(strategy);
        self
    }

    pub fn with_unranked(mut self, strategy: UnrankedStrategy) -> Self {
        self.unranked_strategy = Some(strategy);
        self
    }

    pub fn with_priority(mut self, priority: ConceptResolutionPriority) -> Self {
        self.concept_resolution_priority = Some(priority);
        self
    }

    pub fn with_default_parent(mut self, name: impl Into<String>) -> Self {
        self.default_parent_taxon = Some(name.into());
        self
    }

    pub fn forbidding(mut self, condition: TaxonCondition) -> Self {
        self.adjuster.forbidden.push(condition);
        self
    }

    pub fn adjusting(mut self, condition: TaxonCondition, delta: i32) -> Self {
        self.adjuster
            .adjustments
            .push(ScoreAdjustment { condition, delta });
        self
    }

    pub fn loose(mut self) -> Self {
        self.loose = true;
        self
    }

    pub fn non_authority(mut self) -> Self {
        self.authority = false;
        self
    }
}
