use anyhow::Result;
use std::sync::Arc;
use taxonmerge_core::{InstanceRecord, ProviderConfig, TaxonSource, Taxonomy, TaxonomyConfiguration, UnrankedStrategy};
use taxonmerge_model::{Rank, TaxonomicType};
use taxonmerge_storage::MemoryIndex;

fn resolved(strategy: UnrankedStrategy, taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut config = TaxonomyConfiguration::default();
    config
        .providers
        .push(ProviderConfig::child("afd", "default").with_unranked(strategy));
    let mut taxonomy = Taxonomy::new(config, Arc::new(MemoryIndex::new()))?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    taxonomy.resolve()?;
    Ok(taxonomy)
}

fn taxon(id: &str, name: &str) -> InstanceRecord {
    InstanceRecord::new(id, name).dataset("afd").code("ICZN")
}

fn forwarded_to<'a>(taxonomy: &'a Taxonomy, taxon_id: &str) -> Vec<&'a taxonmerge_core::TaxonConceptInstance> {
    taxonomy
        .instances()
        .iter()
        .filter(|tci| tci.forbidden && tci.accepted_name_usage_id.as_deref() == Some(taxon_id))
        .collect()
}

#[test]
fn test_accepted_unranked_instance_moves_onto_ranked_concept() -> Result<()> {
    let taxonomy = resolved(
        UnrankedStrategy::All,
        vec![
            taxon("s1", "Canis lupus").rank("species").status("accepted"),
            taxon("u1", "Canis lupus").status("accepted"),
        ],
    )?;
    let s1 = taxonomy.get_instance("s1").unwrap();
    let u1 = taxonomy.get_instance("u1").unwrap();

    assert_eq!(taxonomy.instance(u1).rank, Rank::Species);
    assert_eq!(taxonomy.instance(u1).container(), taxonomy.instance(s1).container());
    assert_eq!(taxonomy.reporter().get_count("count.resolve.unrankedTaxonConcept"), 1);

    let originals = forwarded_to(&taxonomy, "u1");
    assert_eq!(originals.len(), 1);
    assert_eq!(originals[0].status, TaxonomicType::InferredSynonym);
    assert_eq!(originals[0].rank, Rank::Unranked);
    assert!(!originals[0].is_output());
    Ok(())
}

#[test]
fn test_synonym_strategy_leaves_accepted_unranked_alone() -> Result<()> {
    let taxonomy = resolved(
        UnrankedStrategy::Synonyms,
        vec![
            taxon("s1", "Canis lupus").rank("species").status("accepted"),
            taxon("v1", "Vulpes vulpes").rank("species").status("accepted"),
            taxon("u1", "Canis lupus").status("accepted"),
            taxon("u2", "Canis lupus").status("synonym").accepted_id("v1"),
        ],
    )?;
    let s1 = taxonomy.get_instance("s1").unwrap();
    let u1 = taxonomy.get_instance("u1").unwrap();
    let u2 = taxonomy.get_instance("u2").unwrap();

    assert_eq!(taxonomy.instance(u1).rank, Rank::Unranked);
    assert_eq!(taxonomy.instance(u2).rank, Rank::Species);
    assert_eq!(taxonomy.instance(u2).container(), taxonomy.instance(s1).container());
    assert_eq!(taxonomy.reporter().get_count("count.resolve.unrankedTaxonConcept"), 1);
    Ok(())
}

#[test]
fn test_no_strategy_reassigns_nothing() -> Result<()> {
    let taxonomy = resolved(
        UnrankedStrategy::None,
        vec![
            taxon("s1", "Canis lupus").rank("species").status("accepted"),
            taxon("u1", "Canis lupus").status("accepted"),
        ],
    )?;
    let u1 = taxonomy.get_instance("u1").unwrap();
    assert_eq!(taxonomy.instance(u1).rank, Rank::Unranked);
    assert!(forwarded_to(&taxonomy, "u1").is_empty());
    assert_eq!(taxonomy.reporter().get_count("count.resolve.unrankedTaxonConcept"), 0);
    Ok(())
}
