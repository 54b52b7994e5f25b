//! Loading records into the name hierarchy.
//!
//! Every instance is filed four levels deep. Missing levels are created on
//! first sight and reused after that:
//!
//! ```text
//!   bare_index[uncoded]  ──► unranked_index[unranked] ──► name_index[name] ──► concept
//! ```

use super::Taxonomy;
use crate::concept::TaxonConcept;
use crate::condition::MatchContext;
use crate::config::ProviderConfig;
use crate::distribution::Distribution;
use crate::element::{
    BareNameId, ConceptId, ElementRef, InstanceId, ProviderId, ScientificNameId, UnrankedNameId,
};
use crate::error::{Result, TaxonomyError};
use crate::instance::{InstanceRecord, TaxonConceptInstance};
use crate::messages::{format_message, template};
use crate::name::{BareName, ScientificName, UnrankedScientificName};
use crate::report::IssueType;
use crate::source::TaxonSource;
use crate::vernacular::{parse_status, VernacularName};
use std::collections::BTreeSet;
use taxonmerge_model::{NameInput, NameKey, NameType, NomenclaturalCode, Rank, TaxonFlag, TaxonomicType};
use uuid::Uuid;

const UNKNOWN_TAXON_NAME: &str = "Unknown taxon";

impl Taxonomy {
    /// Load locations, then every taxon record of a source.
    pub fn load(&mut self, source: &TaxonSource) -> Result<()> {
        tracing::info!(
            phase = "load",
            locations = source.locations.len(),
            taxa = source.taxa.len(),
            "loading source"
        );
        self.locations.load(&source.locations)?;
        for record in &source.taxa {
            self.add_record(record)?;
        }
        tracing::info!(phase = "load", instances = self.instances.len(), "loaded source");
        Ok(())
    }

    /// Convert a verbatim record into an instance and load it.
    ///
    /// Unparseable codes fall back to the provider default, unparseable ranks
    /// become unranked and unparseable statuses inferred unplaced. Unknown
    /// flags are dropped. Unknown locations are an error.
    pub fn add_record(&mut self, record: &InstanceRecord) -> Result<InstanceId> {
        let provider = self.resolve_provider(record.dataset_id.as_deref(), record.dataset_name.as_deref());
        let code = record
            .nomenclatural_code
            .as_deref()
            .and_then(|c| self.analyser.canonicalise_code(c).ok())
            .or_else(|| self.providers.default_code(provider));
        let rank = record
            .taxon_rank
            .as_deref()
            .and_then(|r| self.analyser.canonicalise_rank(r).ok())
            .unwrap_or(Rank::Unranked);
        let status = record
            .taxonomic_status
            .as_deref()
            .and_then(|s| self.analyser.canonicalise_taxonomic_type(s).ok())
            .unwrap_or(TaxonomicType::InferredUnplaced);
        let flags: BTreeSet<TaxonFlag> = record
            .flags
            .iter()
            .filter_map(|f| self.analyser.canonicalise_flag(f).ok())
            .collect();

        let mut tci = TaxonConceptInstance::new(
            record.taxon_id.clone(),
            provider,
            code,
            record.scientific_name.clone(),
            status,
            rank,
        );
        tci.verbatim_code = record.nomenclatural_code.clone();
        tci.verbatim_rank = record.taxon_rank.clone();
        tci.verbatim_status = record.taxonomic_status.clone();
        tci.author = record
            .scientific_name_authorship
            .clone()
            .filter(|a| !a.trim().is_empty());
        tci.name_complete = record.name_complete.clone();
        tci.year = record.year.clone();
        tci.parent_name_usage = record.parent_name_usage.clone();
        tci.parent_name_usage_id = record.parent_name_usage_id.clone();
        tci.accepted_name_usage = record.accepted_name_usage.clone();
        tci.accepted_name_usage_id = record.accepted_name_usage_id.clone();
        if let Some(remarks) = record.taxon_remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            tci.add_remark(remarks);
            tci.verbatim_remarks = Some(remarks.to_string());
        }
        if !record.classification.is_empty() {
            tci.classification = Some(record.classification.clone());
        }
        tci.flags = flags;

        let mut distribution = Vec::with_capacity(record.distribution.len());
        for d in &record.distribution {
            let location = self
                .locations
                .lookup(&d.location_id)
                .ok_or_else(|| TaxonomyError::UnknownLocation(d.location_id.clone()))?;
            let mut entry = Distribution::new(provider, location);
            entry.life_stage = d.life_stage.clone();
            entry.occurrence_status = d.occurrence_status.as_deref().and_then(|s| s.parse().ok());
            distribution.push(entry);
        }
        if !distribution.is_empty() {
            tci.distribution = Some(distribution);
        }
        tci.vernaculars = record
            .vernacular_names
            .iter()
            .map(|v| {
                let mut name = VernacularName::new(
                    v.name_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                    v.vernacular_name.clone(),
                    parse_status(v.status.as_deref()),
                );
                name.language = v.language.clone();
                name
            })
            .collect();
        tci.normalise();
        Ok(self.add_instance(tci))
    }

    /// Find the provider for a dataset, creating a loose child of the
    /// default provider for datasets not seen before.
    pub fn resolve_provider(&mut self, dataset_id: Option<&str>, dataset_name: Option<&str>) -> ProviderId {
        if dataset_id.is_none() && dataset_name.is_none() {
            return self.providers.default_provider();
        }
        if let Some(p) = dataset_id.and_then(|id| self.providers.lookup(id)) {
            return p;
        }
        if let Some(p) = dataset_name.and_then(|name| self.providers.lookup(name)) {
            return p;
        }
        let id = dataset_id.or(dataset_name).unwrap_or_default();
        let default = self.providers.get(self.providers.default_provider()).id().to_string();
        let mut config = ProviderConfig::child(id, default).loose();
        config.name = dataset_name.map(str::to_string);
        let provider = self.providers.insert(config);
        self.report_args(IssueType::Note, "taxonomy.load.provider", &[id, dataset_name.unwrap_or(id)]);
        provider
    }

    /// Analyse, vet and file an instance.
    pub fn add_instance(&mut self, mut tci: TaxonConceptInstance) -> InstanceId {
        let provider = tci.provider;
        let loose = self.providers.get(provider).is_loose();
        let analysis = {
            let name = self.providers.correct_scientific_name(provider, &tci.scientific_name);
            let author = self.providers.correct_author(provider, tci.author.as_deref());
            self.analyser.analyse(
                &NameInput::new(name)
                    .code(tci.code)
                    .author(author)
                    .rank(Some(tci.rank))
                    .status(Some(tci.status))
                    .flags(tci.flags.clone())
                    .loose(loose),
            )
        };
        let dataset_id = self.providers.get(provider).id().to_string();
        let key = {
            let ctx = MatchContext {
                dataset_id: &dataset_id,
                key: None,
                authors: self.analyser.author_comparator(),
            };
            self.providers.adjust_key(provider, analysis.key.clone(), &tci, &ctx)
        };

        match key.name_type() {
            NameType::Placeholder => {
                self.report_args(
                    IssueType::Note,
                    "taxonomy.load.placeholder",
                    &[tci.taxon_id.clone(), tci.display_name()],
                );
                tci.add_remark(template("taxonomy.load.placeholder.remark").unwrap_or_default());
            }
            NameType::NoName => {
                self.report_args(
                    IssueType::Validation,
                    "taxonomy.load.no_name",
                    &[tci.taxon_id.clone(), tci.display_name()],
                );
                tci.add_provenance(template("taxonomy.load.no_name.provenance").unwrap_or_default());
                tci.forbidden = true;
                self.count("count.load.forbidden");
            }
            NameType::Informal | NameType::Doubtful | NameType::Candidatus => {
                self.report_args(
                    IssueType::Note,
                    "taxonomy.load.as_is",
                    &[tci.taxon_id.clone(), tci.display_name()],
                );
            }
            NameType::Scientific | NameType::Virus | NameType::Hybrid | NameType::Cultivar => {}
        }
        self.count(&format!("count.load.name.{}", key.name_type().label()));

        if loose && tci.parent_name_usage_id.is_none() && tci.parent_name_usage.is_none() {
            tci.add_classification_hint("genus", analysis.genus.as_deref());
            tci.add_classification_hint("specificEpithet", analysis.specific_epithet.as_deref());
            tci.add_classification_hint("infraspecificEpithet", analysis.infraspecific_epithet.as_deref());
        }

        if !tci.forbidden {
            let explain = {
                let ctx = MatchContext {
                    dataset_id: &dataset_id,
                    key: Some(&key),
                    authors: self.analyser.author_comparator(),
                };
                self.providers.forbid(provider, &tci, &ctx)
            };
            if let Some(explain) = explain {
                self.count("count.load.forbidden");
                self.report_args(
                    IssueType::Note,
                    "taxonomy.load.forbidden",
                    &[tci.taxon_id.clone(), tci.display_name(), explain.clone()],
                );
                tci.add_remark(format_message("taxonomy.load.forbidden.provenance", &[explain]));
                tci.forbidden = true;
            }
        }

        if self.instance_index.contains_key(&tci.taxon_id) {
            let original = std::mem::replace(&mut tci.taxon_id, Uuid::new_v4().to_string());
            self.report_args(
                IssueType::Validation,
                "taxonomy.load.collision",
                &[original.clone(), tci.display_name(), tci.taxon_id.clone()],
            );
            tci.add_provenance(format_message(
                "taxonomy.load.collision.provenance",
                &[original, dataset_id],
            ));
        }

        let id = self.insert_instance(tci, &key);
        self.count("count.load.instance");
        id
    }

    /// Add an instance made up during resolution. The taxon id must be new.
    pub(crate) fn add_inferred_instance(&mut self, tci: TaxonConceptInstance, key: &NameKey) -> Result<InstanceId> {
        if self.instance_index.contains_key(&tci.taxon_id) {
            return Err(TaxonomyError::DuplicateTaxonId(tci.taxon_id));
        }
        Ok(self.insert_instance(tci, key))
    }

    pub(crate) fn insert_instance(&mut self, tci: TaxonConceptInstance, key: &NameKey) -> InstanceId {
        let id = InstanceId::from_index(self.instances.len());
        self.instance_index.insert(tci.taxon_id.clone(), id);
        self.instances.push(tci);
        self.file_instance(id, key);
        id
    }

    /// Place an instance in the concept for `key`, creating names on the way.
    pub(crate) fn file_instance(&mut self, id: InstanceId, key: &NameKey) -> ConceptId {
        let bare = self.bare_for(key.to_uncoded_name_key());
        let unranked = self.unranked_for(key.to_unranked_name_key(), bare);
        let name = self.name_for(key.to_name_key(), unranked);
        let concept = match self.names[name.index()].child(key) {
            Some(c) => c,
            None => {
                let c = ConceptId::from_index(self.concepts.len());
                self.concepts.push(TaxonConcept::new(key.clone(), name));
                self.concept_index.insert(key.clone(), c);
                self.names[name.index()].add_child(key.clone(), c);
                c
            }
        };
        self.concepts[concept.index()].add_instance(&self.instances, id);
        self.instances[id.index()].container = Some(concept);
        concept
    }

    fn bare_for(&mut self, key: NameKey) -> BareNameId {
        if let Some(id) = self.bare_index.get(&key) {
            return *id;
        }
        let id = BareNameId::from_index(self.bare.len());
        self.bare.push(BareName::new(key.clone(), None));
        self.bare_index.insert(key, id);
        id
    }

    fn unranked_for(&mut self, key: NameKey, bare: BareNameId) -> UnrankedNameId {
        if let Some(id) = self.unranked_index.get(&key) {
            return *id;
        }
        let id = UnrankedNameId::from_index(self.unranked.len());
        self.unranked.push(UnrankedScientificName::new(key.clone(), Some(bare)));
        self.bare[bare.index()].add_child(key.clone(), id);
        self.unranked_index.insert(key, id);
        id
    }

    fn name_for(&mut self, key: NameKey, unranked: UnrankedNameId) -> ScientificNameId {
        if let Some(id) = self.name_index.get(&key) {
            return *id;
        }
        let id = ScientificNameId::from_index(self.names.len());
        self.names.push(ScientificName::new(key.clone(), Some(unranked)));
        self.unranked[unranked.index()].add_child(key.clone(), id);
        self.name_index.insert(key, id);
        id
    }

    /// Make sure the inference provider's unknown taxon exists.
    pub fn provide_unknown_taxon(&mut self) -> Result<()> {
        let inference = self.providers.inference_provider();
        let utid = self
            .providers
            .unknown_taxon_id(inference)
            .map(str::to_string)
            .ok_or_else(|| TaxonomyError::NoUnknownTaxon(self.providers.get(inference).id().to_string()))?;
        if self.get_instance(&utid).is_some() {
            return Ok(());
        }
        let mut ut = TaxonConceptInstance::new(
            utid,
            inference,
            Some(NomenclaturalCode::Zoological),
            UNKNOWN_TAXON_NAME,
            TaxonomicType::InferredUnplaced,
            Rank::Unranked,
        );
        ut.add_remark(template("taxonomy.unknownTaxon.remark").unwrap_or_default());
        let id = self.add_instance(ut);
        tracing::debug!(taxon = %self.instance(id), "provided unknown taxon");
        Ok(())
    }

    /// The unknown taxon for a provider, if it has been loaded.
    pub fn unknown_taxon(&self, provider: ProviderId) -> Option<InstanceId> {
        self.providers
            .unknown_taxon_id(provider)
            .and_then(|id| self.get_instance(id))
    }

    /// Look up a name as a provider would refer to it.
    ///
    /// Uncoded names resolve to a bare name and unranked names to an unranked
    /// name. A ranked name resolves to an instance of the provider when there
    /// is one (accepted instances first), otherwise the scientific name.
    pub fn find_element(
        &self,
        code: Option<NomenclaturalCode>,
        name: &str,
        provider: ProviderId,
        rank: Option<Rank>,
    ) -> Option<ElementRef> {
        let rank = rank.or_else(|| self.analyser.infer_rank(name, None));
        let key = self
            .analyser
            .analyse(
                &NameInput::new(name)
                    .code(code)
                    .rank(rank)
                    .loose(self.providers.get(provider).is_loose()),
            )
            .key
            .to_name_key();
        if key.is_uncoded() {
            return self
                .bare_index
                .get(&key.to_uncoded_name_key())
                .map(|id| ElementRef::Bare(*id));
        }
        if key.is_unranked() {
            return self
                .unranked_index
                .get(&key.to_unranked_name_key())
                .map(|id| ElementRef::Unranked(*id));
        }
        let sn = *self.name_index.get(&key)?;
        Some(self.find_provider_element(sn, provider))
    }

    fn find_provider_element(&self, sn: ScientificNameId, provider: ProviderId) -> ElementRef {
        let concepts = self.scientific_name(sn).children();
        for accepted_only in [true, false] {
            let found = concepts
                .iter()
                .find_map(|c| self.concept(*c).find_instance(&self.instances, provider, accepted_only));
            if let Some(id) = found {
                return id.into();
            }
        }
        sn.into()
    }

    /// A ranked concept for the same name, used to place an unranked one.
    ///
    /// With a rank hint the concepts whose rank is nearest the hint survive.
    /// The highest principal score wins among those.
    pub fn find_ranked_concept(&self, unranked: UnrankedNameId, key: &NameKey, rank: Option<Rank>) -> Option<ConceptId> {
        let mut available: Vec<ConceptId> = Vec::new();
        for sn in self.unranked_name(unranked).children() {
            let name = self.scientific_name(*sn);
            if name.key().is_unranked() {
                continue;
            }
            let ranked = key.to_ranked_name_key(name.rank());
            available.extend(
                name.children()
                    .iter()
                    .copied()
                    .filter(|c| !self.concept(*c).is_cleared() && *self.concept(*c).key() == ranked),
            );
        }
        if available.len() <= 1 {
            return available.first().copied();
        }
        if let Some(rank) = rank {
            let distance = |c: &ConceptId| (rank.id() - self.concept_rank(*c).id()).abs();
            let closest = available.iter().map(distance).min().unwrap_or_default();
            available.retain(|c| distance(c) <= closest);
        }
        let best = available
            .iter()
            .map(|c| self.principal_score((*c).into()))
            .max()?;
        available
            .into_iter()
            .find(|c| self.principal_score((*c).into()) == best)
    }
}
