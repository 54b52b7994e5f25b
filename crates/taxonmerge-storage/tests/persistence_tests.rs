use taxonmerge_storage::persistence::{load_snapshot, save_snapshot};
use taxonmerge_storage::{Document, DocumentIndex, MemoryIndex, Query, StorageError};
use tempfile::tempdir;

#[test]
fn test_snapshot_round_trip_keeps_documents_searchable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index").join("docs.jsonl");

    let index = MemoryIndex::new();
    index
        .add(
            Document::new("Identifier")
                .with("taxonID", "parent")
                .with("identifier", "child")
                .with("status", "discarded"),
        )
        .unwrap();
    index.barrier().unwrap();
    assert_eq!(save_snapshot(&index, &path).unwrap(), 1);

    let loaded = load_snapshot(&path).unwrap();
    let found = loaded
        .search(&Query::of_type("Identifier").and("identifier", "child"))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("taxonID"), Some("parent"));
}

#[test]
fn test_snapshot_refuses_pending_writes() {
    let dir = tempdir().unwrap();
    let index = MemoryIndex::new();
    index.add(Document::new("Identifier")).unwrap();
    match save_snapshot(&index, &dir.path().join("docs.jsonl")) {
        Err(StorageError::Uncommitted { pending }) => assert_eq!(pending, 1),
        other => panic!("expected uncommitted error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_snapshot(&dir.path().join("nope.jsonl")),
        Err(StorageError::Io(_))
    ));
}
