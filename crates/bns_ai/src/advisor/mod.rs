use bns_core::context::{AssembledContext, ContextAssembler};
use bns_core::corpus::{CorpusStore, SectionId};
use bns_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::generate::{GenerationPipeline, GenerationSettings};
use crate::index::SemanticIndex;
use crate::llm::StreamingLlm;
use crate::retrieve::{EmptyReason, IndexSearcher, RetrievalOutcome, Retriever, SimilaritySearch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedQuery {
    pub question: String,
    pub sections: Vec<SectionId>,
    pub context: AssembledContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preparation {
    /// Nothing to ground an answer on; generation must not run.
    NoDocuments(EmptyReason),
    Ready(PreparedQuery),
}

/// Startup state shared by every query: corpus, optional index and backends.
pub struct LegalAdvisor<'a> {
    corpus: &'a CorpusStore,
    index: Option<&'a SemanticIndex>,
    embedder: &'a dyn Embedder,
    llm: &'a dyn StreamingLlm,
    settings: GenerationSettings,
}

impl<'a> LegalAdvisor<'a> {
    pub fn new(
        corpus: &'a CorpusStore,
        index: Option<&'a SemanticIndex>,
        embedder: &'a dyn Embedder,
        llm: &'a dyn StreamingLlm,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            corpus,
            index,
            embedder,
            llm,
            settings,
        }
    }

    /// Retrieve and assemble context for a question.
    pub fn prepare(&self, question: &str) -> Result<Preparation, AppError> {
        let question = checked_question(question)?;
        let Some(index) = self.index else {
            tracing::warn!("semantic index unavailable; skipping retrieval");
            return Ok(Preparation::NoDocuments(EmptyReason::IndexUnavailable));
        };

        let searcher = IndexSearcher::new(index, self.embedder);
        self.prepare_with(&searcher, question)
    }

    /// Same as [`Self::prepare`] against an arbitrary search backend.
    pub fn prepare_with(
        &self,
        search: &dyn SimilaritySearch,
        question: &str,
    ) -> Result<Preparation, AppError> {
        let question = checked_question(question)?;
        let sections = match Retriever::new(search).retrieve(question)? {
            RetrievalOutcome::Sections(sections) => sections,
            RetrievalOutcome::Empty(reason) => return Ok(Preparation::NoDocuments(reason)),
        };
        let context = ContextAssembler::new(self.corpus).assemble(&sections)?;
        Ok(Preparation::Ready(PreparedQuery {
            question: question.to_string(),
            sections,
            context,
        }))
    }

    pub fn answer(
        &self,
        prepared: &PreparedQuery,
        on_update: &mut dyn FnMut(&str),
    ) -> Result<String, AppError> {
        GenerationPipeline::new(self.llm, &self.settings).run(
            &prepared.context.legal_context,
            &prepared.question,
            on_update,
        )
    }
}

fn checked_question(question: &str) -> Result<&str, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::new("AI_QUERY_EMPTY", "Describe the legal situation first"));
    }
    Ok(question)
}
