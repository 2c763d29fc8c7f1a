use bns_core::error::AppError;
use bns_core::sanitize::ResponseState;
use serde::{Deserialize, Serialize};

use crate::llm::{FragmentStream, GenerationRequest, StreamingLlm};

mod prompts;

pub use prompts::legal_guidance_prompt;

pub const DEFAULT_GENERATION_MODEL: &str = "deepseek-r1:1.5b";
/// Low on purpose: literal statutory language over creative variation.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Prompt template → streaming model call → sanitized accumulation.
pub struct GenerationPipeline<'a> {
    llm: &'a dyn StreamingLlm,
    settings: &'a GenerationSettings,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(llm: &'a dyn StreamingLlm, settings: &'a GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Start one generation. The returned stream is lazy and single-use.
    pub fn generate(&self, legal_context: &str, question: &str) -> Result<FragmentStream, AppError> {
        let prompt = legal_guidance_prompt(question, legal_context);
        self.llm.stream(&GenerationRequest {
            model: &self.settings.model,
            prompt: &prompt,
            temperature: self.settings.temperature,
        })
    }

    /// Drive a generation to completion, calling `on_update` with the
    /// sanitized answer so far after every fragment.
    ///
    /// Any stream error aborts with `Err`; the partial text must not be shown
    /// as a finished answer.
    pub fn run(
        &self,
        legal_context: &str,
        question: &str,
        on_update: &mut dyn FnMut(&str),
    ) -> Result<String, AppError> {
        tracing::info!(model = %self.settings.model, "generation started");
        let mut state = ResponseState::new();
        for fragment in self.generate(legal_context, question)? {
            state = state.advance(&fragment?);
            on_update(&state.display);
        }
        tracing::info!(fragments = state.fragments, "generation finished");

        if state.display.is_empty() {
            return Err(AppError::new("AI_GENERATION_FAILED", "Generated answer was empty")
                .with_details(format!("fragments={}", state.fragments)));
        }
        Ok(state.display)
    }
}
