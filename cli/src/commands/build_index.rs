use std::io::{self, Write};
use std::process::ExitCode;

use bns_ai::embeddings::OllamaEmbedder;
use bns_ai::index::{IndexBuildInput, IndexBuilder};
use bns_core::corpus::CorpusStore;
use bns_core::error::AppError;
use clap::Args;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    /// Embedding model; defaults to `ollama.embedding_model`
    #[arg(long)]
    pub model: Option<String>,
}

pub fn run(config: &AppConfig, args: BuildIndexArgs) -> anyhow::Result<ExitCode> {
    let corpus =
        CorpusStore::load(&config.corpus.sections_path, &config.corpus.cross_reference_path)?;
    let embedder = OllamaEmbedder::new(config.ollama.client()?);
    let model = args
        .model
        .unwrap_or_else(|| config.ollama.embedding_model.clone());

    let status = IndexBuilder::new(config.index.dir.clone()).build_with_embedder(
        &corpus,
        &embedder,
        IndexBuildInput {
            model,
            updated_at: now_rfc3339_utc()?,
        },
    )?;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &status)?;
    writeln!(out)?;
    Ok(ExitCode::SUCCESS)
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("AI_INDEX_BUILD_FAILED", "Failed to format time").with_details(e.to_string())
    })
}
