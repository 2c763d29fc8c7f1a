use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bns_core::corpus::CorpusStore;
use bns_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::chunking::{chunk_section_text, MAX_CHUNK_CHARS};
use super::{read_json, IndexStatus, IndexedDocument, DOCUMENTS_FILE, STATUS_FILE};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBuildInput {
    pub model: String,
    pub updated_at: String,
}

/// Writes the index directory consumed by [`super::SemanticIndex::open`].
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    dir: PathBuf,
}

impl IndexBuilder {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.dir.display(), e))
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), AppError> {
        let path = self.dir.join(file);
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(value).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to encode index file")
                .with_details(format!("file={file}; err={e}"))
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to write index file")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to finalize index file write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })
    }

    /// Documents from a previous build with the same model, keyed by `doc_id`.
    fn reusable_documents(&self, model: &str) -> Result<BTreeMap<String, IndexedDocument>, AppError> {
        let status_path = self.dir.join(STATUS_FILE);
        if !status_path.exists() {
            return Ok(BTreeMap::new());
        }
        let status: IndexStatus = read_json(&status_path, "AI_INDEX_BUILD_FAILED")?;
        if !status.ready || status.model.as_deref() != Some(model) {
            return Ok(BTreeMap::new());
        }
        let docs: Vec<IndexedDocument> =
            read_json(&self.dir.join(DOCUMENTS_FILE), "AI_INDEX_BUILD_FAILED")?;
        Ok(docs.into_iter().map(|d| (d.doc_id.clone(), d)).collect())
    }

    /// Embed every section chunk, reusing vectors whose text hash is
    /// unchanged since the last build with the same model.
    pub fn build_with_embedder(
        &self,
        corpus: &CorpusStore,
        embedder: &dyn Embedder,
        input: IndexBuildInput,
    ) -> Result<IndexStatus, AppError> {
        if corpus.is_empty() {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "Corpus has no sections to index",
            ));
        }
        self.ensure_dirs()?;

        let mut previous = self.reusable_documents(&input.model)?;
        let mut documents: Vec<IndexedDocument> = Vec::new();
        let mut dims: Option<u32> = None;
        let mut embedded = 0usize;

        for section_id in corpus.section_ids() {
            let text = corpus.section_text(&section_id)?;
            for (ordinal, chunk) in chunk_section_text(text, MAX_CHUNK_CHARS).into_iter().enumerate() {
                let doc_id = format!("{section_id}:{ordinal}");
                let text_sha256 = hex::encode(Sha256::digest(chunk.as_bytes()));

                let vector = match previous.remove(&doc_id) {
                    Some(prev) if prev.text_sha256 == text_sha256 => prev.vector,
                    _ => {
                        embedded += 1;
                        embedder.embed(&input.model, &chunk).map_err(|e| {
                            AppError::new("AI_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                                .with_details(format!("doc_id={doc_id}; err={e}"))
                                .with_retryable(e.retryable)
                        })?
                    }
                };

                let this_dims = vector.len() as u32;
                match dims {
                    Some(d) if d != this_dims => {
                        return Err(AppError::new(
                            "AI_INDEX_BUILD_FAILED",
                            "Embedding dimension mismatch across chunks",
                        )
                        .with_details(format!("expected={d}; got={this_dims}; doc_id={doc_id}")));
                    }
                    Some(_) => {}
                    None => dims = Some(this_dims),
                }

                documents.push(IndexedDocument {
                    doc_id,
                    section_id: section_id.clone(),
                    ordinal: ordinal as u32,
                    text_sha256,
                    vector,
                });
            }
        }

        // Only after all embeddings succeed.
        self.write_json(DOCUMENTS_FILE, &documents)?;
        let status = IndexStatus {
            ready: true,
            model: Some(input.model),
            dims,
            document_count: documents.len() as u32,
            sections_total: corpus.len() as u32,
            updated_at: Some(input.updated_at),
        };
        self.write_json(STATUS_FILE, &status)?;

        tracing::info!(
            dir = %self.dir.display(),
            documents = documents.len(),
            embedded,
            reused = documents.len() - embedded,
            "semantic index built"
        );
        Ok(status)
    }
}
