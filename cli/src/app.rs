use std::path::Path;

use bns_ai::advisor::LegalAdvisor;
use bns_ai::embeddings::OllamaEmbedder;
use bns_ai::generate::GenerationSettings;
use bns_ai::index::SemanticIndex;
use bns_ai::llm::OllamaLlm;
use bns_core::corpus::CorpusStore;
use bns_core::error::AppError;

use crate::config::AppConfig;

/// Everything loaded once at startup and shared by every query.
pub struct AppContext {
    pub corpus: CorpusStore,
    pub index: Option<SemanticIndex>,
    pub embedder: OllamaEmbedder,
    pub llm: OllamaLlm,
    pub generation: GenerationSettings,
}

impl AppContext {
    /// Corpus and index errors are fatal except a missing index, which only
    /// disables retrieval.
    pub fn load(config: &AppConfig) -> Result<Self, AppError> {
        let corpus =
            CorpusStore::load(&config.corpus.sections_path, &config.corpus.cross_reference_path)?;
        let index = open_index(&config.index.dir)?;
        if let Some(index) = &index {
            if index.model() != config.ollama.embedding_model {
                tracing::warn!(
                    index_model = index.model(),
                    configured = %config.ollama.embedding_model,
                    "index was built with a different embedding model; queries use the index's"
                );
            }
        }

        let client = config.ollama.client()?;
        Ok(Self {
            corpus,
            index,
            embedder: OllamaEmbedder::new(client.clone()),
            llm: OllamaLlm::new(client),
            generation: config.ollama.generation_settings(),
        })
    }

    pub fn advisor(&self) -> LegalAdvisor<'_> {
        LegalAdvisor::new(
            &self.corpus,
            self.index.as_ref(),
            &self.embedder,
            &self.llm,
            self.generation.clone(),
        )
    }
}

/// `Ok(None)` when there is no usable index yet.
pub fn open_index(dir: &Path) -> Result<Option<SemanticIndex>, AppError> {
    match SemanticIndex::open(dir) {
        Ok(index) => Ok(Some(index)),
        Err(e) if e.code == "AI_INDEX_UNAVAILABLE" => {
            tracing::warn!(dir = %dir.display(), error = %e, "semantic index unavailable");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_index_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_index(&dir.path().join("bns_vector_db")).unwrap().is_none());
    }

    #[test]
    fn corrupt_index_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index_status.json"), "{not json").unwrap();
        let err = open_index(dir.path()).unwrap_err();
        assert_eq!(err.code, "AI_INDEX_LOAD_FAILED");
    }

    #[test]
    fn missing_corpus_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.corpus.sections_path = dir.path().join("bns.json");
        config.corpus.cross_reference_path = dir.path().join("bns_to_ipc.json");
        config.index.dir = dir.path().join("bns_vector_db");
        let err = AppContext::load(&config).err().unwrap();
        assert_eq!(err.code, "CORPUS_LOAD_FAILED");
    }
}
