use super::*;

#[test]
fn test_documents_invisible_until_barrier() {
    let index = MemoryIndex::new();
    index
        .add(Document::new("Identifier").with("taxonID", "t1"))
        .unwrap();
    assert_eq!(index.pending(), 1);
    assert!(index.search(&Query::of_type("Identifier")).unwrap().is_empty());

    index.commit().unwrap();
    assert_eq!(index.pending(), 0);
    assert!(
        index.search(&Query::of_type("Identifier")).unwrap().is_empty(),
        "committed but not refreshed"
    );

    index.refresh().unwrap();
    assert_eq!(index.count(&Query::of_type("Identifier")).unwrap(), 1);
}

#[test]
fn test_query_terms_are_conjunctive() {
    let index = MemoryIndex::new();
    index
        .add(
            Document::new("TaxonomicIssue")
                .with("code", "taxonomy.load.collision")
                .with("taxonID", "a"),
        )
        .unwrap();
    index
        .add(
            Document::new("TaxonomicIssue")
                .with("code", "taxonomy.load.collision")
                .with("taxonID", "b"),
        )
        .unwrap();
    index.barrier().unwrap();

    let q = Query::of_type("TaxonomicIssue").and("code", "taxonomy.load.collision");
    assert_eq!(index.count(&q).unwrap(), 2);
    assert_eq!(index.count(&q.clone().and("taxonID", "b")).unwrap(), 1);
    assert_eq!(index.count(&Query::term("taxonID", "c")).unwrap(), 0);
}

#[test]
fn test_multi_valued_fields() {
    let mut doc = Document::new("Taxon").with_opt("remark", None::<String>);
    doc.add("remark", "first");
    doc.add("remark", "second");
    assert_eq!(doc.get("remark"), Some("first"));
    assert_eq!(doc.get_all("remark").len(), 2);
    assert!(doc.require("missing").is_err());
}
