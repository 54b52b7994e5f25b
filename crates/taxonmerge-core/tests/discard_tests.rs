use anyhow::Result;
use std::sync::Arc;
use taxonmerge_core::{
    DiscardStrategy, InstanceRecord, MatchTaxonCondition, NameMatchType, ProviderConfig, TaxonSource, Taxonomy,
    TaxonomyConfiguration, DEFAULT_SCORE, IDENTIFIER_DOCUMENT,
};
use taxonmerge_model::TaxonomicType;
use taxonmerge_storage::{DocumentIndex, MemoryIndex, Query};

fn resolved(provider: ProviderConfig, taxa: Vec<InstanceRecord>) -> Result<(Taxonomy, Arc<MemoryIndex>)> {
    let mut config = TaxonomyConfiguration::default();
    config.providers.push(provider);
    let index = Arc::new(MemoryIndex::new());
    let mut taxonomy = Taxonomy::new(config, index.clone())?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    taxonomy.resolve()?;
    Ok((taxonomy, index))
}

fn canis(dataset: &str) -> Vec<InstanceRecord> {
    vec![
        InstanceRecord::new("g", "Canis")
            .dataset(dataset)
            .code("ICZN")
            .rank("genus")
            .status("accepted"),
        InstanceRecord::new("s", "Canis lupus")
            .dataset(dataset)
            .code("ICZN")
            .rank("species")
            .status("accepted")
            .parent_id("g"),
    ]
}

#[test]
fn test_unused_synthetic_instance_becomes_an_identifier() -> Result<()> {
    let mut taxa = canis("afd");
    taxa[1] = taxa[1].clone().flag("synthetic");
    let (taxonomy, index) = resolved(
        ProviderConfig::child("afd", "default").with_discard(DiscardStrategy::IdentifierToParent),
        taxa,
    )?;
    let s = taxonomy.get_instance("s").unwrap();
    assert!(taxonomy.instance(s).forbidden);
    assert_eq!(taxonomy.reporter().get_count("count.resolve.synthetic.discarded"), 1);
    assert_eq!(taxonomy.reporter().get_count("count.discard.identifier"), 1);

    let found = index.search(&Query::of_type(IDENTIFIER_DOCUMENT).and("identifier", "s"))?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("taxonID"), Some("g"));
    assert_eq!(found[0].get("status"), Some("discarded"));

    let ids: Vec<String> = taxonomy.output_taxa().into_iter().map(|t| t.taxon_id).collect();
    assert!(ids.contains(&"g".to_string()));
    assert!(!ids.contains(&"s".to_string()));
    Ok(())
}

#[test]
fn test_synthetic_parent_in_use_is_kept() -> Result<()> {
    let mut taxa = canis("afd");
    taxa[0] = taxa[0].clone().flag("synthetic");
    let (taxonomy, _) = resolved(
        ProviderConfig::child("afd", "default").with_discard(DiscardStrategy::IdentifierToParent),
        taxa,
    )?;
    let g = taxonomy.get_instance("g").unwrap();
    assert!(!taxonomy.instance(g).forbidden);
    assert_eq!(taxonomy.reporter().get_count("count.resolve.synthetic.discarded"), 0);
    Ok(())
}

#[test]
fn test_forbidden_instance_is_synonymised_to_its_parent() -> Result<()> {
    let forbid = MatchTaxonCondition::new()
        .with_name("Canis lupus", NameMatchType::Exact)
        .into_condition();
    let (taxonomy, _) = resolved(
        ProviderConfig::child("afd", "default")
            .forbidding(forbid)
            .with_discard(DiscardStrategy::SynonymiseToParent),
        canis("afd"),
    )?;
    let s = taxonomy.get_instance("s").unwrap();
    let g = taxonomy.get_instance("g").unwrap();
    let tci = taxonomy.instance(s);
    assert!(!tci.forbidden);
    assert_eq!(tci.status, TaxonomicType::InferredSynonym);
    assert!(tci.parent().is_none());
    assert_eq!(taxonomy.resolved_accepted(s)?, Some(g));
    assert_eq!(taxonomy.reporter().get_count("count.discard.synonym"), 1);

    let taxa = taxonomy.output_taxa();
    let lupus = taxa.iter().find(|t| t.taxon_id == "s").unwrap();
    assert_eq!(lupus.accepted_name_usage_id.as_deref(), Some("g"));
    Ok(())
}

#[test]
fn test_ignored_discards_stay_out_of_the_output() -> Result<()> {
    let forbid = MatchTaxonCondition::new()
        .with_name("Canis lupus", NameMatchType::Exact)
        .into_condition();
    let (taxonomy, index) = resolved(ProviderConfig::child("afd", "default").forbidding(forbid), canis("afd"))?;
    let s = taxonomy.get_instance("s").unwrap();
    assert!(taxonomy.instance(s).forbidden);
    assert_eq!(index.count(&Query::of_type(IDENTIFIER_DOCUMENT))?, 0);
    assert!(taxonomy.output_taxa().iter().all(|t| t.taxon_id != "s"));
    Ok(())
}

#[test]
fn test_synonymised_discard_takes_the_inference_default_score() -> Result<()> {
    let forbid = MatchTaxonCondition::new()
        .with_name("Canis lupus", NameMatchType::Exact)
        .into_condition();
    let mut config = TaxonomyConfiguration::default();
    let inference = config.providers.remove(0).with_name_score("Canis lupus", 900);
    config.providers.insert(0, inference);
    config.providers.push(
        ProviderConfig::child("afd", "default")
            .forbidding(forbid)
            .with_discard(DiscardStrategy::SynonymiseToParent),
    );
    let mut taxonomy = Taxonomy::new(config, Arc::new(MemoryIndex::new()))?;
    taxonomy.load(&TaxonSource::new(canis("afd")))?;
    taxonomy.resolve()?;

    let s = taxonomy.get_instance("s").unwrap();
    assert_eq!(taxonomy.instance(s).status, TaxonomicType::InferredSynonym);
    assert_eq!(taxonomy.score(s), DEFAULT_SCORE);
    assert_eq!(taxonomy.base_score(s), DEFAULT_SCORE);
    Ok(())
}
