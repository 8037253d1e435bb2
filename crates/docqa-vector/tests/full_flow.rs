use std::sync::Arc;
use std::thread;

use docqa_core::config::{IndexBackend, IndexConfig};
use docqa_core::{Error, NewVector, VectorIndex};
use docqa_vector::{open_index, FileVectorIndex};
use tempfile::TempDir;

fn batch(doc: &str, n: usize, dim: usize) -> Vec<NewVector> {
    (0..n)
        .map(|i| {
            let mut embedding = vec![0.1f32; dim];
            embedding[i % dim] = 1.0;
            NewVector { text: format!("{doc} chunk {i}"), embedding, position: i }
        })
        .collect()
}

fn keys(index: &dyn VectorIndex) -> Vec<(String, usize)> {
    index.get_all().unwrap().into_iter().map(|v| (v.document_id, v.position)).collect()
}

/// Behaviour every backend has to share.
fn exercise_contract(index: &dyn VectorIndex) {
    assert!(index.get_all().unwrap().is_empty());
    assert!(index.get_by_document("a.txt").unwrap().is_empty());
    assert_eq!(index.dimension().unwrap(), None);

    index.insert("a.txt", &batch("a", 3, 4)).unwrap();
    index.insert("b.txt", &batch("b", 2, 4)).unwrap();
    assert_eq!(
        keys(index),
        vec![("a.txt".into(), 0), ("a.txt".into(), 1), ("a.txt".into(), 2), ("b.txt".into(), 0), ("b.txt".into(), 1)]
    );
    let a: Vec<usize> = index.get_by_document("a.txt").unwrap().iter().map(|v| v.position).collect();
    assert_eq!(a, vec![0, 1, 2]);
    assert_eq!(index.dimension().unwrap(), Some(4));

    // a batch of another dimension is refused and nothing is written
    let err = index.insert("c.txt", &batch("c", 1, 3)).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3, .. }));
    assert_eq!(index.get_all().unwrap().len(), 5);

    // replace is delete + insert: no duplicates, replaced rows move to the end
    assert_eq!(index.replace_document("a.txt", &batch("a2", 2, 4)).unwrap(), 3);
    assert_eq!(
        keys(index),
        vec![("b.txt".into(), 0), ("b.txt".into(), 1), ("a.txt".into(), 0), ("a.txt".into(), 1)]
    );
    assert!(index.get_by_document("a.txt").unwrap().iter().all(|v| v.text.starts_with("a2")));

    // deleting an unknown document is a no-op
    assert_eq!(index.delete_by_document("x").unwrap(), 0);
    assert_eq!(index.get_all().unwrap().len(), 4);

    let docs = index.documents().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].document_id, "b.txt");
    assert_eq!(docs[1].chunk_count, 2);

    assert_eq!(index.delete_by_document("b.txt").unwrap(), 2);
    assert_eq!(keys(index), vec![("a.txt".into(), 0), ("a.txt".into(), 1)]);
}

#[test]
fn file_backend_contract() {
    let tmp = TempDir::new().expect("tmp");
    let index = FileVectorIndex::open(tmp.path().join("vectors/store.json"));
    exercise_contract(&index);

    // a fresh handle sees the same durable state
    let reopened = FileVectorIndex::open(tmp.path().join("vectors/store.json"));
    assert_eq!(reopened.get_all().unwrap().len(), 2);
}

#[test]
fn concurrent_replaces_never_duplicate() {
    let tmp = TempDir::new().expect("tmp");
    let index = Arc::new(FileVectorIndex::open(tmp.path().join("store.json")));
    index.insert("other.txt", &batch("o", 2, 4)).unwrap();

    thread::scope(|s| {
        for worker in 0..8 {
            let index = Arc::clone(&index);
            s.spawn(move || {
                for _ in 0..5 {
                    index.replace_document("shared.txt", &batch(&format!("w{worker}"), 3, 4)).unwrap();
                    let seen = index.get_by_document("shared.txt").unwrap();
                    assert_eq!(seen.len(), 3, "readers always see a whole document");
                }
            });
        }
    });

    let shared = index.get_by_document("shared.txt").unwrap();
    assert_eq!(shared.len(), 3);
    let positions: Vec<usize> = shared.iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(index.get_by_document("other.txt").unwrap().len(), 2);
}

#[test]
fn open_index_uses_configured_backend() {
    let tmp = TempDir::new().expect("tmp");
    let config = IndexConfig { path: "idx/store.json".into(), ..IndexConfig::default() };
    let index = open_index(&config, tmp.path()).expect("open");
    index.insert("a.txt", &batch("a", 1, 2)).unwrap();
    assert!(tmp.path().join("idx/store.json").exists());
}

#[cfg(not(feature = "lance"))]
#[test]
fn lance_backend_needs_feature() {
    let tmp = TempDir::new().expect("tmp");
    let config = IndexConfig { backend: IndexBackend::Lance, ..IndexConfig::default() };
    assert!(matches!(open_index(&config, tmp.path()), Err(Error::InvalidConfig(_))));
}

#[cfg(feature = "lance")]
#[test]
fn lance_backend_contract() {
    let tmp = TempDir::new().expect("tmp");
    let config = IndexConfig { backend: IndexBackend::Lance, path: "lance".into(), table: "vectors_test".into() };
    let index = open_index(&config, tmp.path()).expect("open");
    exercise_contract(index.as_ref());

    let reopened = open_index(&config, tmp.path()).expect("reopen");
    assert_eq!(reopened.get_all().unwrap().len(), 2);
}

#[cfg(feature = "lance")]
#[test]
fn lance_dimension_outlives_rows() {
    let tmp = TempDir::new().expect("tmp");
    let config = IndexConfig { backend: IndexBackend::Lance, path: "lance".into(), table: "fixed_dim".into() };
    let index = open_index(&config, tmp.path()).expect("open");
    index.insert("a.txt", &batch("a", 2, 4)).unwrap();
    assert_eq!(index.delete_by_document("a.txt").unwrap(), 2);

    assert_eq!(index.dimension().unwrap(), Some(4));
    let err = index.insert("b.txt", &batch("b", 1, 3)).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3, .. }));
}

#[test]
fn emptied_file_store_accepts_a_new_dimension() {
    let tmp = TempDir::new().expect("tmp");
    let index = FileVectorIndex::open(tmp.path().join("store.json"));
    index.insert("a.txt", &batch("a", 2, 4)).unwrap();
    index.delete_by_document("a.txt").unwrap();

    assert_eq!(index.dimension().unwrap(), None);
    index.insert("b.txt", &batch("b", 1, 3)).unwrap();
    assert_eq!(index.dimension().unwrap(), Some(3));
}
