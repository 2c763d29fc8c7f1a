use std::path::{Path, PathBuf};
use std::time::Duration;

use bns_ai::generate::{GenerationSettings, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE};
use bns_ai::ollama::{OllamaClient, OllamaTimeouts};
use bns_core::error::AppError;
use serde::Deserialize;

/// Application configuration. Every field has a default, so each layer may be partial.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub ollama: OllamaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub sections_path: PathBuf,
    pub cross_reference_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub temperature: f32,
    pub connect_timeout_ms: u64,
    pub embed_timeout_secs: u64,
    pub generation_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            sections_path: PathBuf::from("bns.json"),
            cross_reference_path: PathBuf::from("bns_to_ipc.json"),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("bns_vector_db"),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        let timeouts = OllamaTimeouts::default();
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            connect_timeout_ms: timeouts.connect.as_millis() as u64,
            embed_timeout_secs: timeouts.embed.as_secs(),
            generation_timeout_secs: timeouts.generation.as_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        // stdout carries the answer; keep stderr quiet unless asked.
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl OllamaConfig {
    pub fn timeouts(&self) -> OllamaTimeouts {
        let connect = Duration::from_millis(self.connect_timeout_ms);
        OllamaTimeouts {
            connect,
            health: connect,
            embed: Duration::from_secs(self.embed_timeout_secs),
            generation: Duration::from_secs(self.generation_timeout_secs),
        }
    }

    pub fn client(&self) -> Result<OllamaClient, AppError> {
        OllamaClient::with_timeouts(&self.base_url, self.timeouts())
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.generation_model.clone(),
            temperature: self.temperature,
        }
    }
}

impl AppConfig {
    /// Defaults, then `config/default`, `config/local`, the explicit file if
    /// any, then `BNS__SECTION__KEY` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("BNS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>())
            .map_err(|e| {
                AppError::new("CONFIG_LOAD_FAILED", "Failed to load configuration")
                    .with_details(e.to_string())
            })?;

        if !(0.0..=2.0).contains(&config.ollama.temperature) {
            return Err(
                AppError::new("CONFIG_LOAD_FAILED", "Temperature must be between 0 and 2")
                    .with_details(format!("temperature={}", config.ollama.temperature)),
            );
        }
        Ok(config)
    }
}
