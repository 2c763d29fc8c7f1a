use std::io::{BufRead, BufReader};

use bns_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{FragmentStream, GenerationRequest, StreamingLlm};
use crate::ollama::{classify_call_error, classify_io_error, OllamaClient};

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// One NDJSON line of a streamed `/api/chat` response.
#[derive(Debug, Clone, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl StreamingLlm for OllamaLlm {
    fn stream(&self, req: &GenerationRequest<'_>) -> Result<FragmentStream, AppError> {
        let body = ChatRequest {
            model: req.model,
            messages: [ChatMessage {
                role: "user",
                content: req.prompt,
            }],
            stream: true,
            options: ChatOptions {
                temperature: req.temperature,
            },
        };

        let resp = self
            .client
            .post("/api/chat", self.client.timeouts().generation)
            .send_json(body)
            .map_err(|e| classify_call_error(e, "AI_GENERATION_TIMEOUT", "chat"))?;

        Ok(Box::new(ChatStream::new(BufReader::new(resp.into_reader()))))
    }
}

/// Yields the text of each chunk, dropping the JSON envelope. Ends after the
/// `done` chunk; a body that ends without one is an incomplete answer.
pub(crate) struct ChatStream<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> ChatStream<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }

    fn fail(&mut self, err: AppError) -> Option<Result<String, AppError>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for ChatStream<R> {
    type Item = Result<String, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    return self.fail(
                        AppError::new(
                            "AI_BACKEND_UNREACHABLE",
                            "Generation stream ended before completion",
                        )
                        .with_retryable(true),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    let err = classify_io_error(&e, "AI_GENERATION_TIMEOUT", "chat");
                    return self.fail(err);
                }
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let chunk: ChatChunk = match serde_json::from_str(line) {
                Ok(c) => c,
                Err(e) => {
                    let err = AppError::new("AI_GENERATION_FAILED", "Failed to decode generation chunk")
                        .with_details(e.to_string());
                    return self.fail(err);
                }
            };
            if let Some(msg) = chunk.error {
                let err = AppError::new("AI_BACKEND_UNREACHABLE", "Ollama reported a generation error")
                    .with_details(msg)
                    .with_retryable(true);
                return self.fail(err);
            }
            if chunk.done {
                self.finished = true;
            }
            let content = chunk.message.map(|m| m.content).unwrap_or_default();
            if !content.is_empty() {
                return Some(Ok(content));
            }
        }
        None
    }
}
