use anyhow::Result;
use std::sync::Arc;
use taxonmerge_core::{
    ElementRef, InstanceRecord, TaxonSource, Taxonomy, TaxonomyConfiguration, TaxonomyError, DEFAULT_UNKNOWN_TAXON_ID,
    MAX_RESOLUTION_STEPS,
};
use taxonmerge_model::TaxonomicType;
use taxonmerge_storage::MemoryIndex;

fn loaded(taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut taxonomy = Taxonomy::new(TaxonomyConfiguration::default(), Arc::new(MemoryIndex::new()))?;
    taxonomy.load(&TaxonSource::new(taxa))?;
    Ok(taxonomy)
}

/// Load, supply the unknown taxon and link, stopping short of repairs.
fn linked(taxa: Vec<InstanceRecord>) -> Result<Taxonomy> {
    let mut taxonomy = loaded(taxa)?;
    taxonomy.provide_unknown_taxon()?;
    taxonomy.resolve_links()?;
    Ok(taxonomy)
}

fn record(id: &str, name: &str, rank: &str, status: &str) -> InstanceRecord {
    InstanceRecord::new(id, name).code("ICZN").rank(rank).status(status)
}

fn synonym_pair() -> Vec<InstanceRecord> {
    vec![
        record("a", "Canis lupus", "species", "synonym").accepted_id("b"),
        record("b", "Canis familiaris", "species", "synonym").accepted_id("a"),
    ]
}

#[test]
fn test_synonym_loop_is_found_from_every_member() -> Result<()> {
    let taxonomy = linked(synonym_pair())?;
    let a = taxonomy.get_instance("a").unwrap();
    let b = taxonomy.get_instance("b").unwrap();
    // Equal scores, so the smallest taxon id breaks the loop.
    assert_eq!(taxonomy.find_simple_synonym_loop(a), Some(a));
    assert_eq!(taxonomy.find_simple_synonym_loop(b), Some(a));
    Ok(())
}

#[test]
fn test_synonym_loop_breaks_once() -> Result<()> {
    let mut taxonomy = linked(synonym_pair())?;
    taxonomy.resolve_loops()?;
    let a = taxonomy.get_instance("a").unwrap();
    let b = taxonomy.get_instance("b").unwrap();
    let unknown = taxonomy.get_instance(DEFAULT_UNKNOWN_TAXON_ID).unwrap();

    assert_eq!(taxonomy.instance(a).status, TaxonomicType::InferredUnplaced);
    assert!(taxonomy.instance(a).accepted().is_none());
    assert_eq!(taxonomy.instance(a).parent(), Some(ElementRef::Instance(unknown)));
    assert_eq!(taxonomy.instance(b).accepted(), Some(ElementRef::Instance(a)));
    assert_eq!(taxonomy.find_simple_synonym_loop(a), None);
    assert_eq!(taxonomy.reporter().get_count("count.resolve.loop.synonym"), 1);

    taxonomy.resolve_loops()?;
    assert_eq!(taxonomy.reporter().get_count("count.resolve.loop.synonym"), 1);
    Ok(())
}

#[test]
fn test_synonym_loop_resolves_end_to_end() -> Result<()> {
    let mut taxonomy = loaded(synonym_pair())?;
    taxonomy.resolve()?;
    let a = taxonomy.get_instance("a").unwrap();
    let b = taxonomy.get_instance("b").unwrap();
    assert_eq!(taxonomy.resolved_accepted(b)?, Some(a));
    assert_eq!(taxonomy.reporter().issues_with_code("instance.accepted.resolve.loop").len(), 1);
    Ok(())
}

#[test]
fn test_parent_loop_breaks_at_highest_rank() -> Result<()> {
    let mut taxonomy = linked(vec![
        record("g", "Canis", "genus", "accepted").parent_id("f"),
        record("f", "Canidae", "family", "accepted").parent_id("g"),
    ])?;
    let g = taxonomy.get_instance("g").unwrap();
    let f = taxonomy.get_instance("f").unwrap();
    assert_eq!(taxonomy.find_simple_parent_loop(g), Some(f));

    taxonomy.resolve_loops()?;
    let unknown = taxonomy.get_instance(DEFAULT_UNKNOWN_TAXON_ID).unwrap();
    assert_eq!(taxonomy.instance(f).parent(), Some(ElementRef::Instance(unknown)));
    assert_eq!(taxonomy.instance(f).status, TaxonomicType::InferredUnplaced);
    assert_eq!(taxonomy.instance(g).parent(), Some(ElementRef::Instance(f)));
    assert_eq!(taxonomy.find_simple_parent_loop(g), None);
    assert_eq!(taxonomy.reporter().get_count("count.resolve.loop.parent"), 1);
    Ok(())
}

#[test]
fn test_synonym_that_parents_its_accepted_is_unplaced() -> Result<()> {
    let mut taxonomy = linked(vec![
        record("s", "Canis", "genus", "synonym").accepted_id("l"),
        record("l", "Canis lupus", "species", "accepted").parent_id("s"),
    ])?;
    taxonomy.resolve_loops()?;
    let s = taxonomy.get_instance("s").unwrap();
    assert_eq!(taxonomy.instance(s).status, TaxonomicType::InferredUnplaced);
    assert!(taxonomy.instance(s).accepted().is_none());
    assert_eq!(taxonomy.reporter().get_count("count.resolve.loop.synonymParent"), 1);
    Ok(())
}

#[test]
fn test_invalid_parent_goes_under_the_unknown_taxon() -> Result<()> {
    // The classification names a genus that is not loaded, so the bad link
    // degrades to a provenance note instead of failing the run.
    let mut taxonomy = loaded(vec![record("s1", "Canis lupus", "species", "accepted")
        .parent_id("missing")
        .classify("genus", "Vulpes")])?;
    taxonomy.resolve()?;
    let s1 = taxonomy.get_instance("s1").unwrap();
    let unknown = taxonomy.get_instance(DEFAULT_UNKNOWN_TAXON_ID).unwrap();

    let tci = taxonomy.instance(s1);
    assert_eq!(tci.status, TaxonomicType::InferredUnplaced);
    assert_eq!(tci.parent_name_usage_id.as_deref(), Some(DEFAULT_UNKNOWN_TAXON_ID));
    assert_eq!(taxonomy.resolved_parent(s1)?, Some(unknown));
    assert_eq!(taxonomy.reporter().issues_with_code("instance.parent.invalidLink").len(), 1);
    assert_eq!(taxonomy.reporter().issues_with_code("instance.parent.resolve.invalid").len(), 1);
    Ok(())
}

#[test]
fn test_invalid_parent_without_hints_fails_resolution() -> Result<()> {
    let mut taxonomy = loaded(vec![record("s1", "Canis lupus", "species", "accepted").parent_id("missing")])?;
    assert!(matches!(taxonomy.resolve(), Err(TaxonomyError::Links)));
    assert_eq!(taxonomy.reporter().issues_with_code("instance.parent.invalidLink").len(), 1);
    Ok(())
}

fn chain_id(i: usize) -> String {
    format!("n{:03}", i)
}

/// `n000` at the root, each `n{i}` the child of `n{i-1}`.
fn deep_chain(depth: usize) -> Vec<InstanceRecord> {
    (0..depth)
        .map(|i| {
            let epithet: String = [b'a' + (i / 26) as u8, b'a' + (i % 26) as u8]
                .iter()
                .map(|b| *b as char)
                .collect();
            let tci = record(&chain_id(i), &format!("Canis {}", epithet), "species", "accepted");
            if i == 0 {
                tci
            } else {
                tci.parent_id(chain_id(i - 1))
            }
        })
        .collect()
}

#[test]
fn test_deep_parent_chain_is_not_a_loop() -> Result<()> {
    let depth = 90;
    let mut taxonomy = linked(deep_chain(depth))?;
    let leaf = taxonomy.get_instance(&chain_id(depth - 1)).unwrap();
    let bound = taxonomy.get_instance(&chain_id(depth - 1 - MAX_RESOLUTION_STEPS)).unwrap();
    let root = taxonomy.get_instance(&chain_id(0)).unwrap();

    // The search stops at the step bound and hands back where it got to.
    assert_eq!(taxonomy.find_simple_parent_loop(leaf), Some(bound));
    assert_eq!(taxonomy.find_simple_parent_loop(root), None);

    taxonomy.resolve_loops()?;
    assert_eq!(taxonomy.reporter().get_count("count.resolve.loop.parent"), 0);
    for i in 0..depth {
        let tci = taxonomy.instance(taxonomy.get_instance(&chain_id(i)).unwrap());
        assert_eq!(tci.status, TaxonomicType::Accepted, "{} was repaired", tci.taxon_id);
    }
    let parent = taxonomy.get_instance(&chain_id(depth - 2)).unwrap();
    assert_eq!(taxonomy.instance(leaf).parent(), Some(ElementRef::Instance(parent)));
    Ok(())
}
