pub mod advisor;
pub mod embeddings;
pub mod generate;
pub mod index;
pub mod llm;
pub mod ollama;
pub mod retrieve;
