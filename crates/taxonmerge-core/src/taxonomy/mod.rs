//! The taxonomy orchestrator.
//!
//! [`Taxonomy`] owns every arena (instances, concepts and the three name
//! levels) together with the providers, locations, analyser, resolver and
//! reporter. The phases live in submodules as further `impl Taxonomy` blocks:
//!
//! | module | phase |
//! |---|---|
//! | `load` | records → instances, name hierarchy, element lookup |
//! | `scoring` | base score and score |
//! | `chase` | resolved / resolved accepted / resolved parent |
//! | `links` | parent and accepted link resolution |
//! | `loops` | synonym, synonym-parent and parent loop repair |
//! | `resolve` | concept resolution, reallocation, distributions, vernaculars |
//! | `unranked` | moving unranked instances onto ranked concepts |
//! | `principal` | principals for scientific, unranked and bare names |
//! | `discard` | synthetic and forbidden instance handling |
//! | `validate` | structural checks |
//! | `output` | output views and summary |

mod chase;
mod discard;
mod links;
mod load;
mod loops;
mod output;
mod principal;
mod resolve;
mod scoring;
mod unranked;
mod validate;

pub use discard::IDENTIFIER_DOCUMENT;
pub use output::{OutputDistribution, OutputTaxon, Summary};

use crate::concept::TaxonConcept;
use crate::config::TaxonomyConfiguration;
use crate::distribution::LocationRegistry;
use crate::element::{BareNameId, ConceptId, ElementRef, InstanceId, ScientificNameId, UnrankedNameId};
use crate::error::{Result, TaxonomyError};
use crate::instance::TaxonConceptInstance;
use crate::messages::format_message;
use crate::name::{BareName, ScientificName, UnrankedScientificName};
use crate::provider::ProviderRegistry;
use crate::report::{Issue, IssueType, Reporter};
use crate::resolver::{AlaResolver, TaxonResolver};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use taxonmerge_model::{AuthorComparator, BasicNameAnalyser, NameAnalyser, NameKey, Rank};
use taxonmerge_storage::DocumentIndex;

pub struct Taxonomy {
    config: TaxonomyConfiguration,
    providers: ProviderRegistry,
    analyser: Arc<dyn NameAnalyser>,
    resolver: Arc<dyn TaxonResolver>,
    reporter: Reporter,
    locations: LocationRegistry,
    instances: Vec<TaxonConceptInstance>,
    concepts: Vec<TaxonConcept>,
    names: Vec<ScientificName>,
    unranked: Vec<UnrankedScientificName>,
    bare: Vec<BareName>,
    instance_index: AHashMap<String, InstanceId>,
    concept_index: AHashMap<NameKey, ConceptId>,
    name_index: AHashMap<NameKey, ScientificNameId>,
    unranked_index: AHashMap<NameKey, UnrankedNameId>,
    bare_index: AHashMap<NameKey, BareNameId>,
}

impl Taxonomy {
    /// A taxonomy with the basic analyser and the ALA resolver.
    pub fn new(config: TaxonomyConfiguration, index: Arc<dyn DocumentIndex>) -> Result<Self> {
        let comparator = AuthorComparator::with_author_map(&config.author_map);
        let analyser = BasicNameAnalyser::with_author_comparator(comparator)?
            .with_informal_patterns(config.informal_patterns.as_slice())?;
        Self::with_parts(config, Arc::new(analyser), Arc::new(AlaResolver::new()), index)
    }

    pub fn with_parts(
        config: TaxonomyConfiguration,
        analyser: Arc<dyn NameAnalyser>,
        resolver: Arc<dyn TaxonResolver>,
        index: Arc<dyn DocumentIndex>,
    ) -> Result<Self> {
        config.validate()?;
        let providers = ProviderRegistry::new(
            &config.providers,
            &config.default_provider,
            config.inference_provider_id(),
        )?;
        tracing::info!(
            id = %config.id,
            providers = providers.len(),
            accepted_cutoff = config.accepted_cutoff,
            "created taxonomy"
        );
        Ok(Self {
            config,
            providers,
            analyser,
            resolver,
            reporter: Reporter::new(index),
            locations: LocationRegistry::new(),
            instances: Vec::new(),
            concepts: Vec::new(),
            names: Vec::new(),
            unranked: Vec::new(),
            bare: Vec::new(),
            instance_index: AHashMap::new(),
            concept_index: AHashMap::new(),
            name_index: AHashMap::new(),
            unranked_index: AHashMap::new(),
            bare_index: AHashMap::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &TaxonomyConfiguration {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn analyser(&self) -> &dyn NameAnalyser {
        self.analyser.as_ref()
    }

    pub fn resolver(&self) -> &dyn TaxonResolver {
        self.resolver.as_ref()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn index(&self) -> &Arc<dyn DocumentIndex> {
        self.reporter.index()
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn accepted_cutoff(&self) -> i32 {
        self.config.accepted_cutoff
    }

    pub fn instance(&self, id: InstanceId) -> &TaxonConceptInstance {
        &self.instances[id.index()]
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> &mut TaxonConceptInstance {
        &mut self.instances[id.index()]
    }

    pub fn instances(&self) -> &[TaxonConceptInstance] {
        &self.instances
    }

    pub fn instance_ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        (0..self.instances.len()).map(InstanceId::from_index)
    }

    /// The registered instance for a taxon id.
    pub fn get_instance(&self, taxon_id: &str) -> Option<InstanceId> {
        self.instance_index.get(taxon_id).copied()
    }

    pub fn concept(&self, id: ConceptId) -> &TaxonConcept {
        &self.concepts[id.index()]
    }

    pub fn concepts(&self) -> &[TaxonConcept] {
        &self.concepts
    }

    pub fn concept_ids(&self) -> impl Iterator<Item = ConceptId> + '_ {
        (0..self.concepts.len()).map(ConceptId::from_index)
    }

    pub fn concept_for_key(&self, key: &NameKey) -> Option<ConceptId> {
        self.concept_index.get(key).copied()
    }

    pub fn scientific_name(&self, id: ScientificNameId) -> &ScientificName {
        &self.names[id.index()]
    }

    pub fn scientific_name_ids(&self) -> impl Iterator<Item = ScientificNameId> + '_ {
        (0..self.names.len()).map(ScientificNameId::from_index)
    }

    pub fn unranked_name(&self, id: UnrankedNameId) -> &UnrankedScientificName {
        &self.unranked[id.index()]
    }

    pub fn unranked_name_ids(&self) -> impl Iterator<Item = UnrankedNameId> + '_ {
        (0..self.unranked.len()).map(UnrankedNameId::from_index)
    }

    pub fn bare_name(&self, id: BareNameId) -> &BareName {
        &self.bare[id.index()]
    }

    pub fn bare_name_ids(&self) -> impl Iterator<Item = BareNameId> + '_ {
        (0..self.bare.len()).map(BareNameId::from_index)
    }

    // ========================================================================
    // Elements
    // ========================================================================

    /// The instance that stands for an element.
    pub fn representative(&self, element: ElementRef) -> Option<InstanceId> {
        match element {
            ElementRef::Instance(id) => Some(id),
            ElementRef::Concept(id) => self.concept(id).representative(&self.instances),
            ElementRef::Scientific(id) => self.representative(self.scientific_name(id).principal()?.into()),
            ElementRef::Unranked(id) => self.representative(self.unranked_name(id).principal()?.into()),
            ElementRef::Bare(id) => self.representative(self.bare_name(id).principal()?.into()),
        }
    }

    pub fn concept_rank(&self, id: ConceptId) -> Rank {
        self.concept(id).rank(&self.instances)
    }

    pub fn element_rank(&self, element: ElementRef) -> Rank {
        match element {
            ElementRef::Instance(id) => self.instance(id).rank,
            ElementRef::Concept(id) => self.concept_rank(id),
            ElementRef::Scientific(id) => self.scientific_name(id).rank(),
            ElementRef::Unranked(id) => self.unranked_name(id).rank(),
            ElementRef::Bare(id) => self.bare_name(id).rank(),
        }
    }

    pub fn element_key(&self, element: ElementRef) -> Option<&NameKey> {
        match element {
            ElementRef::Instance(id) => self.instance(id).container().map(|c| self.concept(c).key()),
            ElementRef::Concept(id) => Some(self.concept(id).key()),
            ElementRef::Scientific(id) => Some(self.scientific_name(id).key()),
            ElementRef::Unranked(id) => Some(self.unranked_name(id).key()),
            ElementRef::Bare(id) => Some(self.bare_name(id).key()),
        }
    }

    /// Taxon id of the representative, if there is one.
    pub fn element_taxon_id(&self, element: ElementRef) -> Option<&str> {
        self.representative(element)
            .map(|id| self.instance(id).taxon_id.as_str())
    }

    /// Distinct ranks of the instances, root first.
    pub(crate) fn ordered_ranks(&self, ids: impl IntoIterator<Item = InstanceId>) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = ids.into_iter().map(|id| self.instance(id).rank).collect();
        ranks.sort_by_key(|r| (r.sort_order(), r.id()));
        ranks.dedup();
        ranks
    }

    pub fn describe(&self, element: ElementRef) -> String {
        match element {
            ElementRef::Instance(id) => self.instance(id).to_string(),
            ElementRef::Concept(id) => self.concept(id).describe(id, &self.instances),
            ElementRef::Scientific(id) => format!("SN#{}[{}]", id.index(), self.scientific_name(id).key()),
            ElementRef::Unranked(id) => format!("USN#{}[{}]", id.index(), self.unranked_name(id).key()),
            ElementRef::Bare(id) => format!("BN#{}[{}]", id.index(), self.bare_name(id).key()),
        }
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Report an issue about an element. See [`crate::messages`] for how the
    /// template slots are filled.
    pub fn report(&self, kind: IssueType, code: &str, main: Option<ElementRef>, associated: &[ElementRef]) {
        let subject = main.and_then(|e| self.representative(e)).map(|id| self.instance(id));
        let associated_ids: Vec<String> = associated
            .iter()
            .map(|e| {
                self.element_taxon_id(*e)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.describe(*e))
            })
            .collect();
        let args = [
            subject.map(|s| s.taxon_id.clone()).unwrap_or_default(),
            subject.map(TaxonConceptInstance::display_name).unwrap_or_default(),
            associated_ids.join("|"),
            main.map(|e| self.describe(e)).unwrap_or_default(),
            associated
                .iter()
                .map(|e| self.describe(*e))
                .collect::<Vec<_>>()
                .join(", "),
        ];
        let mut issue = Issue::new(kind, code, format_message(code, &args));
        if let Some(s) = subject {
            issue.taxon_id = Some(s.taxon_id.clone());
            issue.name_complete = s.name_complete.clone();
            issue.scientific_name = Some(s.scientific_name.clone());
            issue.author = s.author.clone();
            issue.rank = Some(s.rank.label().to_string());
            issue.status = Some(s.status.term().to_string());
            issue.dataset_id = Some(self.providers.get(s.provider).id().to_string());
        }
        issue.associated = associated_ids;
        self.reporter.record(issue);
    }

    /// Report an issue with positional arguments. The first argument is
    /// taken as the taxon id.
    pub fn report_args<S: AsRef<str>>(&self, kind: IssueType, code: &str, args: &[S]) {
        let mut issue = Issue::new(kind, code, format_message(code, args));
        issue.taxon_id = args.first().map(|a| a.as_ref().to_string());
        self.reporter.record(issue);
    }

    pub fn count(&self, key: &str) {
        self.reporter.count(key);
    }

    pub fn count_by(&self, key: &str, n: u64) {
        self.reporter.count_by(key, n);
    }

    pub fn counts(&self) -> BTreeMap<String, u64> {
        self.reporter.counts()
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Run every resolution phase in order.
    pub fn resolve(&mut self) -> Result<()> {
        tracing::info!(
            instances = self.instances.len(),
            concepts = self.concepts.len(),
            "resolving taxonomy"
        );
        self.provide_unknown_taxon()?;
        self.resolve_links()?;
        self.resolve_loops()?;
        self.resolve_invalid_parents()?;
        if !self.validate() {
            return Err(TaxonomyError::InvalidSourceData);
        }
        self.compute_scores();
        self.validate_name_collisions();
        self.resolve_taxon();
        self.resolve_unranked(false)?;
        self.resolve_unranked(true)?;
        self.resolve_principal()?;
        self.detect_discards();
        self.resolve_discards()?;
        if !self.validate() {
            return Err(TaxonomyError::InvalidResolution);
        }
        self.resolve_distributions();
        self.build_preferred_vernacular();
        self.index().barrier()?;
        tracing::info!(
            errors = self.reporter.tally(IssueType::Error),
            validation = self.reporter.tally(IssueType::Validation),
            problems = self.reporter.tally(IssueType::Problem),
            "resolved taxonomy"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Taxonomy")
            .field("id", &self.config.id)
            .field("instances", &self.instances.len())
            .field("concepts", &self.concepts.len())
            .field("names", &self.names.len())
            .finish()
    }
}
