use anyhow::Result;
use proptest::prelude::*;
use std::sync::Arc;
use taxonmerge_core::score::clamp_score;
use taxonmerge_core::{
    InstanceRecord, MatchTaxonCondition, NameMatchType, ProviderConfig, TaxonSource, Taxonomy, TaxonomyConfiguration,
    DEFAULT_SCORE, MAX_SCORE, MIN_SCORE,
};
use taxonmerge_model::Rank;
use taxonmerge_storage::MemoryIndex;

fn linked(providers: Vec<ProviderConfig>, taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut config = TaxonomyConfiguration::default();
    config.providers.extend(providers);
    let mut taxonomy = Taxonomy::new(config, Arc::new(MemoryIndex::new()))?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    taxonomy.provide_unknown_taxon()?;
    taxonomy.resolve_links()?;
    Ok(taxonomy)
}

fn record(id: &str, name: &str, rank: &str, dataset: &str) -> InstanceRecord {
    InstanceRecord::new(id, name)
        .dataset(dataset)
        .code("ICZN")
        .rank(rank)
        .status("accepted")
}

#[test]
fn test_owned_names_score_highest() -> Result<()> {
    let taxonomy = linked(
        vec![ProviderConfig::child("afd", "default").owning("Canis lupus")],
        vec![
            record("s1", "Canis lupus", "species", "afd"),
            record("s2", "Vulpes vulpes", "species", "afd"),
        ],
    )?;
    assert_eq!(taxonomy.score(taxonomy.get_instance("s1").unwrap()), MAX_SCORE);
    assert_eq!(taxonomy.score(taxonomy.get_instance("s2").unwrap()), DEFAULT_SCORE);
    Ok(())
}

#[test]
fn test_forbidden_instances_score_lowest() -> Result<()> {
    let forbid = MatchTaxonCondition::new()
        .with_name("Canis lupus", NameMatchType::Exact)
        .into_condition();
    let taxonomy = linked(
        vec![ProviderConfig::child("col", "default").forbidding(forbid)],
        vec![record("s1", "Canis lupus", "species", "col")],
    )?;
    let s1 = taxonomy.get_instance("s1").unwrap();
    assert!(taxonomy.instance(s1).forbidden);
    assert_eq!(taxonomy.score(s1), MIN_SCORE);
    assert!(taxonomy.instance(s1).remark_string().is_some());
    assert_eq!(taxonomy.reporter().get_count("count.load.forbidden"), 1);
    Ok(())
}

#[test]
fn test_name_score_is_inherited_from_same_provider_parent() -> Result<()> {
    let taxonomy = linked(
        vec![
            ProviderConfig::child("afd", "default").with_name_score("Canis", 150),
            ProviderConfig::child("col", "default").with_score(80),
        ],
        vec![
            record("g1", "Canis", "genus", "afd"),
            record("s1", "Canis lupus", "species", "afd").parent_id("g1"),
            record("s2", "Canis familiaris", "species", "col").parent_id("g1"),
        ],
    )?;
    assert_eq!(taxonomy.base_score(taxonomy.get_instance("g1").unwrap()), 150);
    assert_eq!(taxonomy.base_score(taxonomy.get_instance("s1").unwrap()), 150);
    // Parent from another provider: the provider default applies.
    assert_eq!(taxonomy.base_score(taxonomy.get_instance("s2").unwrap()), 80);
    Ok(())
}

#[test]
fn test_adjustments_apply_to_matching_instances() -> Result<()> {
    let subspecies = MatchTaxonCondition::new().with_rank(Rank::Subspecies).into_condition();
    let taxonomy = linked(
        vec![ProviderConfig::child("afd", "default").adjusting(subspecies, -50)],
        vec![
            record("s1", "Canis lupus", "species", "afd"),
            record("ss1", "Canis lupus dingo", "subspecies", "afd"),
        ],
    )?;
    assert_eq!(taxonomy.score(taxonomy.get_instance("s1").unwrap()), DEFAULT_SCORE);
    assert_eq!(taxonomy.score(taxonomy.get_instance("ss1").unwrap()), DEFAULT_SCORE - 50);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_adjusted_scores_stay_in_bounds(delta in -3_000_000i32..3_000_000) {
        let any = MatchTaxonCondition::new().into_condition();
        let taxonomy = linked(
            vec![ProviderConfig::child("afd", "default").adjusting(any, delta)],
            vec![record("s1", "Canis lupus", "species", "afd")],
        ).unwrap();
        let score = taxonomy.score(taxonomy.get_instance("s1").unwrap());
        prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
        prop_assert_eq!(score, clamp_score(DEFAULT_SCORE as i64 + delta as i64));
    }
}
