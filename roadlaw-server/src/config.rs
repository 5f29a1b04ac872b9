//! Service configuration read from the environment.
//!
//! A `.env` file in the working directory (or a parent) is loaded first;
//! variables already set in the process environment win. Empty values count
//! as unset.

use std::fmt::Display;
use std::str::FromStr;

use roadlaw_agent::{PipelineConfig, PipelineMode};
use roadlaw_rag::{DEFAULT_COLLECTION, RagConfig};

use crate::error::ConfigError;

const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_EMBEDDING_BASE: &str = "https://api.jina.ai/v1";
const DEFAULT_DENSE_MODEL: &str = "jina-embeddings-v3";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

/// Chat-completions provider used by the agent, the generator and the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModelSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub reranker_model: String,
}

/// Dense embedding endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
}

/// Everything the `roadlaw` binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When set, the chat endpoint requires `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    pub chat: ChatModelSettings,
    pub embedding: EmbeddingSettings,
    pub qdrant: QdrantSettings,
    pub rag: RagConfig,
    pub pipeline: PipelineConfig,
    pub log: LogSettings,
}

impl ServerConfig {
    /// Load `.env`, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let openai_key = vars.required("OPENAI_API_KEY")?;
        let chat = ChatModelSettings {
            api_key: openai_key.clone(),
            base_url: vars.get("OPENAI_BASE_URL"),
            model: vars.or("OPENAI_MODEL", DEFAULT_CHAT_MODEL),
            reranker_model: vars.or("RERANKER_MODEL", DEFAULT_CHAT_MODEL),
        };
        let embedding = EmbeddingSettings {
            api_key: vars.get("EMBEDDING_API_KEY").unwrap_or(openai_key),
            base_url: vars.or("EMBEDDING_BASE_URL", DEFAULT_EMBEDDING_BASE),
            model: vars.or("DENSE_MODEL_NAME", DEFAULT_DENSE_MODEL),
            dimensions: vars.parsed("EMBEDDING_DIMENSIONS", 1024)?,
        };
        let qdrant = QdrantSettings {
            url: vars.or("QDRANT_URL", "http://localhost:6334"),
            api_key: vars.get("QDRANT_API_KEY"),
        };

        let rag = RagConfig::builder()
            .collection(vars.or("QDRANT_COLLECTION", DEFAULT_COLLECTION))
            .hybrid_limit(vars.parsed("HYBRID_SEARCH_TOP_K", 40)?)
            .rerank_top_k(vars.parsed("RERANK_TOP_K", 5)?)
            .build()?;

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            mode: vars.parsed("PIPELINE_MODE", PipelineMode::default())?,
            max_agent_cycles: vars.parsed("MAX_AGENT_CYCLES", defaults.max_agent_cycles)?,
            ..defaults
        };

        let log = LogSettings {
            format: vars.parsed("LOG_FORMAT", LogFormat::default())?,
            level: vars.or("LOG_LEVEL", "info"),
        };

        Ok(Self {
            host: vars.or("BACKEND_HOST", "0.0.0.0"),
            port: vars.parsed("BACKEND_PORT", 8000)?,
            api_key: vars.get("SERVER_API_KEY"),
            chat,
            embedding,
            qdrant,
            rag,
            pipeline,
            log,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }
}
