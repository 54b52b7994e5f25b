use anyhow::Result;
use std::sync::Arc;
use taxonmerge_core::{
    ConceptResolutionPriority, InstanceId, InstanceRecord, IssueType, ProviderConfig, TaxonSource, Taxonomy,
    TaxonomyConfiguration,
};
use taxonmerge_model::TaxonomicType;
use taxonmerge_storage::MemoryIndex;

fn resolved(providers: Vec<ProviderConfig>, taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut config = TaxonomyConfiguration::default();
    config.providers.extend(providers);
    let mut taxonomy = Taxonomy::new(config, Arc::new(MemoryIndex::new()))?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    taxonomy.resolve()?;
    Ok(taxonomy)
}

fn acacia(id: &str, dataset: &str, author: Option<&str>) -> InstanceRecord {
    let record = InstanceRecord::new(id, "Acacia dealbata")
        .dataset(dataset)
        .code("ICN")
        .rank("species")
        .status("accepted");
    match author {
        Some(author) => record.author(author),
        None => record,
    }
}

fn principal_of(taxonomy: &Taxonomy, id: InstanceId) -> Option<taxonmerge_core::ConceptId> {
    let concept = taxonomy.instance(id).container()?;
    taxonomy
        .scientific_name(taxonomy.concept(concept).container())
        .principal()
}

#[test]
fn test_authored_collision_picks_the_highest_score() -> Result<()> {
    let taxonomy = resolved(
        vec![
            ProviderConfig::child("afd", "default").with_score(200),
            ProviderConfig::child("col", "default").with_score(100),
        ],
        vec![acacia("a1", "afd", Some("Link")), acacia("c1", "col", Some("Benth."))],
    )?;
    let a1 = taxonomy.get_instance("a1").unwrap();
    let c1 = taxonomy.get_instance("c1").unwrap();

    assert_ne!(taxonomy.instance(a1).container(), taxonomy.instance(c1).container());
    assert_eq!(principal_of(&taxonomy, a1), taxonomy.instance(a1).container());
    let collisions = taxonomy.reporter().issues_with_code("scientificName.collision");
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].kind, IssueType::Collision);

    // Neither concept is owned, so both stand.
    assert_eq!(taxonomy.resolved(c1)?, Some(c1));
    let ids: Vec<String> = taxonomy.output_taxa().into_iter().map(|t| t.taxon_id).collect();
    assert!(ids.contains(&"a1".to_string()));
    assert!(ids.contains(&"c1".to_string()));
    Ok(())
}

#[test]
fn test_unauthored_concept_folds_into_the_authored_principal() -> Result<()> {
    let taxonomy = resolved(
        vec![
            ProviderConfig::child("afd", "default").with_score(200),
            ProviderConfig::child("col", "default").with_score(100),
        ],
        vec![acacia("a1", "afd", Some("Link")), acacia("c1", "col", None)],
    )?;
    let a1 = taxonomy.get_instance("a1").unwrap();
    let c1 = taxonomy.get_instance("c1").unwrap();
    let principal = taxonomy.instance(a1).container().unwrap();

    assert_eq!(taxonomy.instance(c1).container(), Some(principal));
    assert_eq!(taxonomy.resolved(c1)?, Some(a1));
    assert!(taxonomy.instance(c1).provenance_string().is_some());
    assert_eq!(taxonomy.reporter().get_count("count.reallocate.taxonConcept"), 1);

    let cleared: Vec<_> = taxonomy
        .concept_ids()
        .filter(|c| taxonomy.concept(*c).is_cleared())
        .collect();
    assert_eq!(cleared.len(), 1);
    let name = taxonomy.concept(principal).container();
    assert!(!taxonomy.scientific_name(name).children().contains(&cleared[0]));

    let ids: Vec<String> = taxonomy.output_taxa().into_iter().map(|t| t.taxon_id).collect();
    assert!(!ids.contains(&"c1".to_string()));
    Ok(())
}

#[test]
fn test_lower_priority_concepts_are_secondary() -> Result<()> {
    let taxonomy = resolved(
        vec![
            ProviderConfig::child("afd", "default").with_score(200),
            ProviderConfig::child("col", "default")
                .with_score(100)
                .with_priority(ConceptResolutionPriority::Filler),
        ],
        vec![acacia("a1", "afd", Some("Link")), acacia("c1", "col", Some("Benth."))],
    )?;
    let a1 = taxonomy.get_instance("a1").unwrap();
    let c1 = taxonomy.get_instance("c1").unwrap();

    assert_eq!(taxonomy.instance(c1).container(), taxonomy.instance(a1).container());
    assert_eq!(taxonomy.resolved(c1)?, Some(a1));
    assert_eq!(taxonomy.reporter().get_count("count.reallocate.secondary"), 1);
    Ok(())
}

#[test]
fn test_owned_principal_gives_authored_concepts_inferred_synonyms() -> Result<()> {
    let taxonomy = resolved(
        vec![
            ProviderConfig::child("afd", "default")
                .with_score(200)
                .owning("Acacia dealbata"),
            ProviderConfig::child("col", "default").with_score(100),
        ],
        vec![acacia("a1", "afd", Some("Link")), acacia("c1", "col", Some("Benth."))],
    )?;
    assert_eq!(taxonomy.reporter().get_count("count.resolve.inferredSynonym"), 1);
    let inferred: Vec<_> = taxonomy
        .instances()
        .iter()
        .filter(|tci| tci.status == TaxonomicType::InferredSynonym)
        .collect();
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].accepted_name_usage_id.as_deref(), Some("a1"));
    assert_eq!(inferred[0].author.as_deref(), Some("Benth."));
    Ok(())
}

#[test]
fn test_lub_is_reflexive_and_reaches_common_parent() -> Result<()> {
    let taxonomy = resolved(
        Vec::new(),
        vec![
            InstanceRecord::new("g1", "Canis")
                .code("ICZN")
                .rank("genus")
                .status("accepted"),
            InstanceRecord::new("s1", "Canis lupus")
                .code("ICZN")
                .rank("species")
                .status("accepted")
                .parent_id("g1"),
            InstanceRecord::new("s2", "Canis latrans")
                .code("ICZN")
                .rank("species")
                .status("accepted")
                .parent_id("g1"),
        ],
    )?;
    let g1 = taxonomy.get_instance("g1").unwrap();
    let s1 = taxonomy.get_instance("s1").unwrap();
    let s2 = taxonomy.get_instance("s2").unwrap();
    let resolver = taxonomy.resolver();

    assert_eq!(resolver.lub(&taxonomy, s1, s1), Some(s1));
    assert_eq!(resolver.lub(&taxonomy, s1, g1), Some(g1));
    assert_eq!(resolver.lub(&taxonomy, s1, s2), Some(g1));
    assert_eq!(resolver.lub_all(&taxonomy, &[s1, s2, g1]), Some(g1));
    assert_eq!(resolver.lub_all(&taxonomy, &[]), None);
    Ok(())
}
