use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use taxonmerge_core::{InstanceRecord, LocationRecord, ProviderConfig, TaxonSource, Taxonomy, TaxonomyConfiguration};
use taxonmerge_storage::MemoryIndex;

fn taxonomy(providers: Vec<ProviderConfig>) -> Result<Taxonomy> {
    let mut config = TaxonomyConfiguration::default();
    config.providers.extend(providers);
    Ok(Taxonomy::new(config, Arc::new(MemoryIndex::new()))?)
}

fn resolved(providers: Vec<ProviderConfig>, taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut taxonomy = taxonomy(providers)?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    taxonomy.resolve()?;
    Ok(taxonomy)
}

fn species(id: &str, name: &str, dataset: &str) -> InstanceRecord {
    InstanceRecord::new(id, name)
        .dataset(dataset)
        .code("ICZN")
        .rank("species")
        .status("accepted")
}

fn wolf_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::child("afd", "default").with_score(200),
        ProviderConfig::child("col", "default").with_score(100),
    ]
}

fn output_ids(taxonomy: &Taxonomy) -> BTreeSet<String> {
    taxonomy.output_taxa().into_iter().map(|t| t.taxon_id).collect()
}

#[test]
fn test_higher_scoring_authority_supplies_the_principal() -> Result<()> {
    let taxonomy = resolved(
        wolf_providers(),
        vec![
            species("a1", "Canis lupus", "afd").author("Linnaeus, 1758"),
            species("c1", "Canis lupus", "col").author("Linnaeus, 1758"),
        ],
    )?;
    let a1 = taxonomy.get_instance("a1").unwrap();
    let c1 = taxonomy.get_instance("c1").unwrap();

    assert_eq!(taxonomy.instance(a1).container(), taxonomy.instance(c1).container());
    assert_eq!(taxonomy.resolved(a1)?, Some(a1));
    assert_eq!(taxonomy.resolved(c1)?, Some(a1));

    let ids = output_ids(&taxonomy);
    assert!(ids.contains("a1"));
    assert!(!ids.contains("c1"));
    Ok(())
}

#[test]
fn test_every_instance_of_a_resolved_concept_is_mapped() -> Result<()> {
    let taxonomy = resolved(
        wolf_providers(),
        vec![
            species("a1", "Canis lupus", "afd").author("Linnaeus, 1758"),
            species("c1", "Canis lupus", "col").author("Linnaeus, 1758"),
            InstanceRecord::new("c2", "Canis familiaris")
                .dataset("col")
                .code("ICZN")
                .rank("species")
                .status("synonym")
                .accepted_id("c1"),
            species("c3", "Vulpes vulpes", "col"),
        ],
    )?;

    for id in taxonomy.concept_ids() {
        let concept = taxonomy.concept(id);
        if concept.is_cleared() {
            continue;
        }
        let resolution = concept.resolution().expect("every concept is resolved");
        for instance in concept.instances() {
            assert!(
                resolution.resolved(*instance).is_some(),
                "{} has no resolution",
                taxonomy.instance(*instance)
            );
        }
        for principal in resolution.principal() {
            assert_eq!(resolution.resolved(*principal), Some(*principal));
        }
    }
    Ok(())
}

#[test]
fn test_synonym_output_points_at_resolved_accepted() -> Result<()> {
    let taxonomy = resolved(
        wolf_providers(),
        vec![
            species("a1", "Canis lupus", "afd").author("Linnaeus, 1758"),
            species("c1", "Canis lupus", "col").author("Linnaeus, 1758"),
            InstanceRecord::new("c2", "Canis familiaris")
                .dataset("col")
                .code("ICZN")
                .rank("species")
                .status("synonym")
                .accepted_id("c1"),
        ],
    )?;
    let c2 = taxonomy.get_instance("c2").unwrap();
    let a1 = taxonomy.get_instance("a1").unwrap();
    assert_eq!(taxonomy.resolved_accepted(c2)?, Some(a1));

    let taxa = taxonomy.output_taxa();
    let familiaris = taxa.iter().find(|t| t.taxon_id == "c2").unwrap();
    assert_eq!(familiaris.accepted_name_usage_id.as_deref(), Some("a1"));
    assert!(familiaris.parent_name_usage_id.is_none());
    Ok(())
}

#[test]
fn test_classification_supplies_the_parent() -> Result<()> {
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
                .classify("genus", "Canis"),
        ],
    )?;
    let g1 = taxonomy.get_instance("g1").unwrap();
    let s1 = taxonomy.get_instance("s1").unwrap();
    assert_eq!(taxonomy.resolved_parent(s1)?, Some(g1));

    let taxa = taxonomy.output_taxa();
    let lupus = taxa.iter().find(|t| t.taxon_id == "s1").unwrap();
    assert_eq!(lupus.parent_name_usage_id.as_deref(), Some("g1"));
    Ok(())
}

#[test]
fn test_preferred_vernacular_goes_to_the_principal() -> Result<()> {
    let taxonomy = resolved(
        wolf_providers(),
        vec![
            species("a1", "Canis lupus", "afd")
                .author("Linnaeus, 1758")
                .vernacular("Wolf", None),
            species("c1", "Canis lupus", "col")
                .author("Linnaeus, 1758")
                .vernacular("Grey Wolf", Some("preferred")),
        ],
    )?;
    let a1 = taxonomy.get_instance("a1").unwrap();
    let concept = taxonomy.instance(a1).container().unwrap();
    assert_eq!(
        taxonomy.concept(concept).preferred().map(|v| v.vernacular_name.as_str()),
        Some("Grey Wolf")
    );

    let taxa = taxonomy.output_taxa();
    let wolf = taxa.iter().find(|t| t.taxon_id == "a1").unwrap();
    assert_eq!(wolf.vernacular_name.as_deref(), Some("Grey Wolf"));
    assert_eq!(taxonomy.reporter().get_count("count.vernacular.preferred"), 1);
    Ok(())
}

#[test]
fn test_summary_counts_output_and_issues() -> Result<()> {
    let taxonomy = resolved(
        wolf_providers(),
        vec![
            species("a1", "Canis lupus", "afd").author("Linnaeus, 1758"),
            species("c1", "Canis lupus", "col").author("Linnaeus, 1758"),
        ],
    )?;
    let summary = taxonomy.summary();
    assert_eq!(summary.output_taxa, taxonomy.output_taxa().len());
    assert_eq!(summary.issues.get("VALIDATION"), Some(&0));
    assert_eq!(summary.issues.get("ERROR"), Some(&0));
    assert_eq!(summary.providers, 3);
    Ok(())
}

#[test]
fn test_distributions_merge_onto_the_principal() -> Result<()> {
    let location = |id: &str, parent: Option<&str>| LocationRecord {
        location_id: id.to_string(),
        parent_location_id: parent.map(str::to_string),
        locality: id.to_uppercase(),
        ..LocationRecord::default()
    };
    let mut source = TaxonSource::new(vec![
        species("a1", "Canis lupus", "afd")
            .author("Linnaeus, 1758")
            .located("nsw"),
        species("c1", "Canis lupus", "col")
            .author("Linnaeus, 1758")
            .located("aus")
            .located("nz"),
    ]);
    source.locations = vec![location("aus", None), location("nsw", Some("aus")), location("nz", None)];

    let mut taxonomy = taxonomy(wolf_providers())?;
    taxonomy.load(&source)?;
    taxonomy.resolve()?;

    let taxa = taxonomy.output_taxa();
    let wolf = taxa.iter().find(|t| t.taxon_id == "a1").unwrap();
    let locations: Vec<&str> = wolf
        .distribution
        .iter()
        .flatten()
        .map(|d| d.location_id.as_str())
        .collect();
    assert_eq!(locations, vec!["aus", "nz"]);
    assert_eq!(wolf.distribution.as_ref().unwrap()[0].locality, "AUS");
    Ok(())
}
