use std::fs;
use std::path::{Path, PathBuf};

use bns_core::corpus::SectionId;
use bns_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;

pub mod builder;
pub mod chunking;
mod similarity;

pub use builder::{IndexBuildInput, IndexBuilder};

pub(crate) const STATUS_FILE: &str = "index_status.json";
pub(crate) const DOCUMENTS_FILE: &str = "index_documents.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub document_count: u32,
    #[serde(default)]
    pub sections_total: u32,
    pub updated_at: Option<String>,
}

/// One embedded chunk of a section. `section_id` is required: an index
/// written without it fails to load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    pub doc_id: String,
    pub section_id: SectionId,
    pub ordinal: u32,
    pub text_sha256: String,
    pub vector: Vec<f32>,
}

/// Search hit. Cosine similarity: higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    pub doc_id: String,
    pub section_id: SectionId,
    pub score: f32,
}

/// Precomputed section embeddings, loaded once and never written by queries.
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    dir: PathBuf,
    status: IndexStatus,
    model: String,
    dims: u32,
    documents: Vec<IndexedDocument>,
    norms: Vec<f32>,
}

impl SemanticIndex {
    /// Open the index directory read-only.
    ///
    /// A missing directory (or one that was never finished building) is
    /// `AI_INDEX_UNAVAILABLE`; callers skip retrieval. Anything present but
    /// unreadable is `AI_INDEX_LOAD_FAILED`.
    pub fn open(dir: &Path) -> Result<Self, AppError> {
        if !dir.is_dir() {
            return Err(unavailable(dir, "Index directory not found"));
        }
        let status_path = dir.join(STATUS_FILE);
        if !status_path.exists() {
            return Err(unavailable(dir, "Index status missing; build the index first"));
        }
        let status: IndexStatus = read_json(&status_path, "AI_INDEX_LOAD_FAILED")?;
        if !status.ready {
            return Err(unavailable(dir, "Index not ready; build the index first"));
        }
        let model = status.model.clone().ok_or_else(|| {
            AppError::new("AI_INDEX_LOAD_FAILED", "Index status missing model")
                .with_details(format!("path={}", status_path.display()))
        })?;
        let dims = status.dims.ok_or_else(|| {
            AppError::new("AI_INDEX_LOAD_FAILED", "Index status missing dims")
                .with_details(format!("path={}", status_path.display()))
        })?;

        let documents: Vec<IndexedDocument> =
            read_json(&dir.join(DOCUMENTS_FILE), "AI_INDEX_LOAD_FAILED")?;
        let mut norms = Vec::with_capacity(documents.len());
        for doc in &documents {
            if doc.vector.len() as u32 != dims {
                return Err(AppError::new("AI_INDEX_LOAD_FAILED", "Index vector dims mismatch")
                    .with_details(format!(
                        "doc_id={}; expected={dims}; got={}",
                        doc.doc_id,
                        doc.vector.len()
                    )));
            }
            norms.push(similarity::l2_norm(&doc.vector));
        }

        tracing::info!(
            dir = %dir.display(),
            model = %model,
            dims,
            documents = documents.len(),
            "semantic index opened"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            status,
            model,
            dims,
            documents,
            norms,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    /// Embedding model the index was built with; queries must use the same one.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Top-`k` documents by cosine similarity, ties broken by `doc_id` ascending.
    pub fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query must not be empty"));
        }
        if k == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let qv = embedder.embed(&self.model, q)?;
        if qv.len() as u32 != self.dims {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", self.dims, qv.len())));
        }
        let qnorm = similarity::l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query embedding norm is zero"));
        }

        let mut hits: Vec<(usize, f32)> = self
            .documents
            .iter()
            .zip(self.norms.iter())
            .enumerate()
            .filter(|(_, (_, norm))| **norm != 0.0)
            .map(|(i, (doc, norm))| (i, similarity::cosine_similarity(&qv, &doc.vector, qnorm, *norm)))
            .collect();

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.documents[a.0].doc_id.cmp(&self.documents[b.0].doc_id))
        });
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                doc_id: self.documents[i].doc_id.clone(),
                section_id: self.documents[i].section_id.clone(),
                score,
            })
            .collect())
    }
}

fn unavailable(dir: &Path, message: &str) -> AppError {
    AppError::new("AI_INDEX_UNAVAILABLE", message).with_details(format!("path={}", dir.display()))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, code: &str) -> Result<T, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(code, "Failed to read index file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new(code, "Failed to decode index file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}
