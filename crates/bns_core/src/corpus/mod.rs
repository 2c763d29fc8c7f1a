use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

mod text;

pub use text::{join_fragments, normalize_text};

/// Externally defined key of one statutory section ("103", "115", ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric reading of the identifier, used only by the fallback padding.
    pub fn as_number(&self) -> Option<u64> {
        self.0.trim().parse::<u64>().ok()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Read-only section text and cross-reference text, keyed by section identifier.
///
/// Values are stored already normalized (fragments joined with single spaces,
/// whitespace runs collapsed).
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    sections: BTreeMap<String, String>,
    cross_references: BTreeMap<String, String>,
}

impl CorpusStore {
    /// Load both documents. Any I/O or parse failure is a startup error.
    pub fn load(sections_path: &Path, cross_reference_path: &Path) -> Result<Self, AppError> {
        let sections = read_fragment_document(sections_path)?;
        if sections.is_empty() {
            return Err(AppError::new("CORPUS_LOAD_FAILED", "Section document has no entries")
                .with_details(format!("path={}", sections_path.display())));
        }
        let cross_references = read_fragment_document(cross_reference_path)?;

        let store = Self::from_fragments(sections, cross_references);
        tracing::info!(
            sections = store.sections.len(),
            cross_references = store.cross_references.len(),
            "corpus loaded"
        );
        Ok(store)
    }

    pub fn from_fragments(
        sections: BTreeMap<String, Vec<String>>,
        cross_references: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let join = |m: BTreeMap<String, Vec<String>>| {
            m.into_iter()
                .map(|(k, v)| (k, join_fragments(&v)))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            sections: join(sections),
            cross_references: join(cross_references),
        }
    }

    pub fn section_text(&self, id: &SectionId) -> Result<&str, AppError> {
        self.sections
            .get(id.as_str())
            .map(String::as_str)
            .ok_or_else(|| AppError::key_not_found("sections", id.as_str()))
    }

    pub fn cross_reference(&self, id: &SectionId) -> Result<&str, AppError> {
        self.cross_references
            .get(id.as_str())
            .map(String::as_str)
            .ok_or_else(|| AppError::key_not_found("cross_references", id.as_str()))
    }

    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.keys().map(|k| SectionId::new(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn cross_reference_count(&self) -> usize {
        self.cross_references.len()
    }
}

fn read_fragment_document(path: &Path) -> Result<BTreeMap<String, Vec<String>>, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("CORPUS_LOAD_FAILED", "Failed to read corpus document")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("CORPUS_LOAD_FAILED", "Failed to decode corpus document")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}
