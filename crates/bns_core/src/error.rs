use serde::{Deserialize, Serialize};
use std::fmt;

/// Codes for conditions a query can recover from: the user sees a message and
/// may retry, the process keeps running.
const RECOVERABLE_CODES: &[&str] = &[
    "AI_INDEX_UNAVAILABLE",
    "AI_PADDING_FAILED",
    "AI_BACKEND_UNREACHABLE",
    "AI_INDEX_TIMEOUT",
    "AI_GENERATION_TIMEOUT",
];

/// Single structured error shape used across the corpus, retrieval and generation layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Lookup failure against the section or cross-reference document.
    pub fn key_not_found(document: &str, section_id: &str) -> Self {
        Self::new("CORPUS_KEY_NOT_FOUND", "Section identifier not present in corpus")
            .with_details(format!("document={document}; section_id={section_id}"))
    }

    pub fn is_recoverable(&self) -> bool {
        self.retryable || RECOVERABLE_CODES.contains(&self.code.as_str())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
