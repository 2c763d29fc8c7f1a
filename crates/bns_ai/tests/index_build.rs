use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use bns_ai::embeddings::Embedder;
use bns_ai::index::{IndexBuildInput, IndexBuilder, SemanticIndex};
use bns_core::corpus::CorpusStore;
use bns_core::error::AppError;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Deterministic embedding: [len, first_byte, last_byte]
        let bytes = input.as_bytes();
        let first = bytes.first().copied().unwrap_or(0) as f32;
        let last = bytes.last().copied().unwrap_or(0) as f32;
        Ok(vec![bytes.len() as f32, first, last])
    }
}

fn corpus(theft_text: &str) -> CorpusStore {
    let mut sections = BTreeMap::new();
    sections.insert("303".to_string(), vec![theft_text.to_string()]);
    sections.insert("115".to_string(), vec!["Voluntarily causing hurt.".to_string()]);
    CorpusStore::from_fragments(sections, BTreeMap::new())
}

fn input(model: &str, at: &str) -> IndexBuildInput {
    IndexBuildInput {
        model: model.to_string(),
        updated_at: at.to_string(),
    }
}

#[test]
fn builds_index_incrementally_and_embeds_only_changed_sections() {
    let dir = tempdir().unwrap();
    let builder = IndexBuilder::new(dir.path().join("bns_vector_db"));
    let embedder = CountingEmbedder::new();

    let st = builder
        .build_with_embedder(&corpus("Theft."), &embedder, input("mock", "2026-10-01T00:00:00Z"))
        .expect("build_index");
    assert!(st.ready);
    assert_eq!(st.document_count, 2);
    assert_eq!(st.sections_total, 2);
    assert_eq!(st.model.as_deref(), Some("mock"));
    assert_eq!(st.dims, Some(3));
    assert_eq!(embedder.call_count(), 2);

    // Rebuild without changes: no new embeddings.
    builder
        .build_with_embedder(&corpus("Theft."), &embedder, input("mock", "2026-10-02T00:00:00Z"))
        .expect("build_index_2");
    assert_eq!(embedder.call_count(), 2);

    // Only the changed section is embedded again.
    builder
        .build_with_embedder(&corpus("Theft of property."), &embedder, input("mock", "2026-10-03T00:00:00Z"))
        .expect("build_index_3");
    assert_eq!(embedder.call_count(), 3);

    // A different model invalidates every vector.
    builder
        .build_with_embedder(&corpus("Theft of property."), &embedder, input("other", "2026-10-04T00:00:00Z"))
        .expect("build_index_4");
    assert_eq!(embedder.call_count(), 5);

    let index = SemanticIndex::open(builder.dir()).expect("open");
    assert_eq!(index.len(), 2);
    assert_eq!(index.model(), "other");
    assert_eq!(index.status().updated_at.as_deref(), Some("2026-10-04T00:00:00Z"));
}

#[test]
fn long_sections_become_several_documents_for_one_section() {
    let dir = tempdir().unwrap();
    let builder = IndexBuilder::new(dir.path().to_path_buf());
    let sentence = format!("{}.", "w".repeat(900));
    let long = format!("{sentence} {sentence} {sentence}");

    let st = builder
        .build_with_embedder(&corpus(&long), &CountingEmbedder::new(), input("mock", "t"))
        .unwrap();
    assert_eq!(st.document_count, 4);

    let raw = fs::read_to_string(dir.path().join("index_documents.json")).unwrap();
    assert!(raw.contains("\"303:0\""));
    assert!(raw.contains("\"303:2\""));
    assert!(raw.contains("\"115:0\""));
}

#[test]
fn missing_directory_is_unavailable_not_fatal() {
    let dir = tempdir().unwrap();
    let err = SemanticIndex::open(&dir.path().join("absent")).unwrap_err();
    assert_eq!(err.code, "AI_INDEX_UNAVAILABLE");
    assert!(err.is_recoverable());

    // Directory exists but was never built.
    let err = SemanticIndex::open(dir.path()).unwrap_err();
    assert_eq!(err.code, "AI_INDEX_UNAVAILABLE");
}

#[test]
fn documents_without_section_id_fail_to_load() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("index_status.json"),
        r#"{"ready":true,"model":"mock","dims":2,"document_count":1,"updated_at":null}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("index_documents.json"),
        r#"[{"doc_id":"a","ordinal":0,"text_sha256":"x","vector":[1.0,0.0]}]"#,
    )
    .unwrap();

    let err = SemanticIndex::open(dir.path()).unwrap_err();
    assert_eq!(err.code, "AI_INDEX_LOAD_FAILED");
    assert!(!err.is_recoverable());
}

#[test]
fn vector_dimension_mismatch_fails_to_load() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("index_status.json"),
        r#"{"ready":true,"model":"mock","dims":3,"document_count":1,"updated_at":null}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("index_documents.json"),
        r#"[{"doc_id":"a","section_id":"1","ordinal":0,"text_sha256":"x","vector":[1.0,0.0]}]"#,
    )
    .unwrap();

    let err = SemanticIndex::open(dir.path()).unwrap_err();
    assert_eq!(err.code, "AI_INDEX_LOAD_FAILED");
    assert!(err.details.unwrap_or_default().contains("doc_id=a"));
}
