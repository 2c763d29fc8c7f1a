use std::io::{self, Write};
use std::process::ExitCode;

use bns_ai::index::{IndexStatus, SemanticIndex};
use bns_core::corpus::CorpusStore;
use bns_core::error::AppError;

use crate::config::AppConfig;

/// Point-in-time view of everything `ask` depends on.
#[derive(Debug)]
pub struct HealthReport {
    pub ollama: Result<Vec<String>, AppError>,
    pub corpus: Result<CorpusCounts, AppError>,
    pub index: Result<IndexStatus, AppError>,
    pub embedding_model: String,
    pub generation_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusCounts {
    pub sections: usize,
    pub cross_references: usize,
}

impl HealthReport {
    pub fn collect(config: &AppConfig) -> Self {
        let ollama = config.ollama.client().and_then(|client| client.list_models());
        let corpus =
            CorpusStore::load(&config.corpus.sections_path, &config.corpus.cross_reference_path)
                .map(|c| CorpusCounts {
                    sections: c.len(),
                    cross_references: c.cross_reference_count(),
                });
        let index = SemanticIndex::open(&config.index.dir).map(|i| i.status().clone());

        Self {
            ollama,
            corpus,
            index,
            embedding_model: config.ollama.embedding_model.clone(),
            generation_model: config.ollama.generation_model.clone(),
        }
    }

    /// `ask` can answer: backend up with the generation model pulled, corpus loaded.
    /// A missing index only degrades to "no documents".
    pub fn is_healthy(&self) -> bool {
        let model_ok = self
            .ollama
            .as_ref()
            .is_ok_and(|models| has_model(models, &self.generation_model));
        model_ok && self.corpus.is_ok()
    }

    /// One line per dependency, newline-terminated.
    pub fn render(&self) -> String {
        let commit = option_env!("GIT_COMMIT_HASH").unwrap_or("unknown");
        let mut lines = vec![format!("bns-guide {} ({commit})", env!("CARGO_PKG_VERSION"))];

        match &self.ollama {
            Ok(models) => {
                lines.push(format!("ollama: ok ({} models)", models.len()));
                for (role, model) in [
                    ("generation", &self.generation_model),
                    ("embedding", &self.embedding_model),
                ] {
                    let state = if has_model(models, model) { "present" } else { "missing" };
                    lines.push(format!("  {role} model {model}: {state}"));
                }
            }
            Err(e) => lines.push(format!("ollama: unreachable: {e}")),
        }

        lines.push(match &self.corpus {
            Ok(c) => format!(
                "corpus: ok ({} sections, {} cross references)",
                c.sections, c.cross_references
            ),
            Err(e) => format!("corpus: failed: {e}"),
        });

        lines.push(match &self.index {
            Ok(status) => format!(
                "index: ready ({} documents, model {}, dims {}, updated {})",
                status.document_count,
                status.model.as_deref().unwrap_or("?"),
                status.dims.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string()),
                status.updated_at.as_deref().unwrap_or("?"),
            ),
            Err(e) if e.code == "AI_INDEX_UNAVAILABLE" => {
                "index: not built (run `bns-guide build-index`)".to_string()
            }
            Err(e) => format!("index: failed: {e}"),
        });

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Ollama reports untagged pulls as `name:latest`.
fn has_model(models: &[String], wanted: &str) -> bool {
    models
        .iter()
        .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted))
}

pub fn run(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let report = HealthReport::collect(config);
    io::stdout().write_all(report.render().as_bytes())?;
    Ok(if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
