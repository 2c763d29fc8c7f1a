use bns_core::error::AppError;

/// Lazy, finite sequence of text fragments from one generation call.
/// Consumed once; a new query needs a new stream.
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, AppError>> + Send>;

#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

pub trait StreamingLlm {
    fn stream(&self, req: &GenerationRequest<'_>) -> Result<FragmentStream, AppError>;
}

pub mod ollama_llm;

pub use ollama_llm::OllamaLlm;
