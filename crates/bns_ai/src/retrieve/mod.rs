use bns_core::corpus::SectionId;
use bns_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::index::{ScoredDocument, SemanticIndex};

/// Documents requested from the similarity search per query.
pub const SEARCH_K: usize = 5;
/// Upper bound on distinct sections handed to context assembly.
pub const MAX_SECTIONS: usize = 4;
/// Below this many distinct sections the numeric padding kicks in.
pub const MIN_SECTIONS: usize = 2;

/// Similarity search seam. Production uses [`IndexSearcher`]; tests inject hits.
pub trait SimilaritySearch {
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>, AppError>;
}

/// [`SemanticIndex`] paired with the embedder that encodes incoming queries.
pub struct IndexSearcher<'a> {
    index: &'a SemanticIndex,
    embedder: &'a dyn Embedder,
}

impl<'a> IndexSearcher<'a> {
    pub fn new(index: &'a SemanticIndex, embedder: &'a dyn Embedder) -> Self {
        Self { index, embedder }
    }
}

impl SimilaritySearch for IndexSearcher<'_> {
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>, AppError> {
        self.index.search(self.embedder, query, k)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    /// No index directory to search.
    IndexUnavailable,
    /// The similarity search returned nothing.
    NoDocuments,
    /// Fallback padding hit a non-numeric section identifier.
    PaddingFailed { section_id: SectionId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// 2..=4 distinct sections in encounter order.
    Sections(Vec<SectionId>),
    Empty(EmptyReason),
}

pub struct Retriever<'a> {
    search: &'a dyn SimilaritySearch,
}

impl<'a> Retriever<'a> {
    pub fn new(search: &'a dyn SimilaritySearch) -> Self {
        Self { search }
    }

    /// Backend failures propagate; an empty search or a failed padding step
    /// becomes [`RetrievalOutcome::Empty`].
    pub fn retrieve(&self, query: &str) -> Result<RetrievalOutcome, AppError> {
        let docs = self.search.search(query, SEARCH_K)?;
        tracing::debug!(documents = docs.len(), "similarity search finished");
        if docs.is_empty() {
            return Ok(RetrievalOutcome::Empty(EmptyReason::NoDocuments));
        }

        match select_sections(&docs) {
            Ok(sections) => {
                tracing::info!(
                    sections = ?sections.iter().map(SectionId::as_str).collect::<Vec<_>>(),
                    "sections selected"
                );
                Ok(RetrievalOutcome::Sections(sections))
            }
            Err(e) if e.code == "AI_PADDING_FAILED" => {
                tracing::warn!(error = %e, "section padding failed; treating as empty retrieval");
                let section_id = docs
                    .last()
                    .map(|d| d.section_id.clone())
                    .unwrap_or_else(|| SectionId::new(""));
                Ok(RetrievalOutcome::Empty(EmptyReason::PaddingFailed { section_id }))
            }
            Err(e) => Err(e),
        }
    }
}

/// Distinct section identifiers in first-seen order, capped at
/// [`MAX_SECTIONS`], padded up to [`MIN_SECTIONS`] when short.
pub fn select_sections(docs: &[ScoredDocument]) -> Result<Vec<SectionId>, AppError> {
    let mut sections: Vec<SectionId> = Vec::with_capacity(MAX_SECTIONS);
    for doc in docs {
        if !sections.contains(&doc.section_id) {
            sections.push(doc.section_id.clone());
        }
    }
    sections.truncate(MAX_SECTIONS);

    if !sections.is_empty() && sections.len() < MIN_SECTIONS {
        pad_sections(&mut sections)?;
    }
    Ok(sections)
}

/// Numeric-neighbour padding: read the last identifier as N, append N+1,
/// then read the new last and append it minus one (N again). Identifiers
/// already selected are not repeated.
///
/// Adjacent section numbers are not guaranteed to be related; this is kept
/// for compatibility with the existing corpus behaviour only.
pub fn pad_sections(sections: &mut Vec<SectionId>) -> Result<(), AppError> {
    let next = last_as_number(sections)?
        .checked_add(1)
        .ok_or_else(|| padding_error(sections.last()))?;
    push_distinct(sections, SectionId::new(next.to_string()));

    let prev = last_as_number(sections)?
        .checked_sub(1)
        .ok_or_else(|| padding_error(sections.last()))?;
    push_distinct(sections, SectionId::new(prev.to_string()));
    Ok(())
}

fn last_as_number(sections: &[SectionId]) -> Result<u64, AppError> {
    let last = sections.last();
    last.and_then(SectionId::as_number)
        .ok_or_else(|| padding_error(last))
}

fn padding_error(last: Option<&SectionId>) -> AppError {
    AppError::new(
        "AI_PADDING_FAILED",
        "Cannot pad sections from a non-numeric section identifier",
    )
    .with_details(format!(
        "section_id={}",
        last.map(SectionId::as_str).unwrap_or_default()
    ))
}

fn push_distinct(sections: &mut Vec<SectionId>, id: SectionId) {
    if !sections.contains(&id) {
        sections.push(id);
    }
}
