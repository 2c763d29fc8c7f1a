use bns_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::{classify_call_error, OllamaClient};

const MAX_EMBED_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = truncate_at_char_boundary(input, MAX_EMBED_BYTES);
        let req = EmbeddingsRequest { model, prompt };

        let resp = self
            .client
            .post("/api/embeddings", self.client.timeouts().embed)
            .send_json(req)
            .map_err(|e| classify_call_error(e, "AI_INDEX_TIMEOUT", "embeddings"))?;

        let v: EmbeddingsResponse = resp.into_json().map_err(|e| {
            AppError::new("AI_EMBEDDINGS_FAILED", "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if v.embedding.is_empty() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response was empty",
            )
            .with_details(format!("model={model}")));
        }
        Ok(v.embedding)
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::truncate_at_char_boundary;

    #[test]
    fn truncation_never_splits_a_character() {
        assert_eq!(truncate_at_char_boundary("abc", 10), "abc");
        assert_eq!(truncate_at_char_boundary("abcdef", 3), "abc");
        // "धारा" is 12 bytes of 3-byte chars; 4 bytes lands mid-char.
        assert_eq!(truncate_at_char_boundary("धारा", 4), "ध");
    }
}
