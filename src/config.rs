//! Configuration
//!
//! Everything is read from the environment (after loading `.env`), with
//! defaults matching the house-style service's production settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Which text-generation backend to talk to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
    OpenAI {
        base_url: String,
        api_key: Option<String>,
        model: String,
    },
    Ollama {
        host: String,
        port: u16,
        model: String,
    },
}

/// Tunables for one document run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub window_words: usize,
    pub window_overlap: usize,
    pub guard_threshold: f32,
    pub guard_length_ratio: f32,
    pub min_rewrite_words: usize,
    pub audit_chunk_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_words: 200,
            window_overlap: 20,
            guard_threshold: 0.5,
            guard_length_ratio: 0.8,
            min_rewrite_words: 20,
            audit_chunk_chars: 1800,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.window_words == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "window size must be at least one word".into(),
            ));
        }
        if self.window_overlap >= self.window_words {
            return Err(PipelineError::InvalidConfiguration(format!(
                "overlap ({}) must be smaller than window size ({})",
                self.window_overlap, self.window_words
            )));
        }
        if !(0.0..=1.0).contains(&self.guard_threshold) {
            return Err(PipelineError::InvalidConfiguration(format!(
                "guard threshold {} is outside [0, 1]",
                self.guard_threshold
            )));
        }
        if self.audit_chunk_chars == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "audit chunk budget must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Retry/timeout/rate settings shared by every external call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub requests_per_minute: u32,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 2,
            requests_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub pipeline: PipelineConfig,
    pub calls: CallConfig,
    pub framework_table: PathBuf,
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub public_base_url: String,
    pub signing_secret: String,
    pub signed_url_ttl: Duration,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> PipelineResult<Self> {
        dotenv::dotenv().ok();

        let pipeline = PipelineConfig {
            window_words: env_or("WINDOW_WORDS", 200)?,
            window_overlap: env_or("WINDOW_OVERLAP", 20)?,
            guard_threshold: env_or("GUARD_THRESHOLD", 0.5)?,
            guard_length_ratio: env_or("GUARD_LENGTH_RATIO", 0.8)?,
            min_rewrite_words: env_or("MIN_REWRITE_WORDS", 20)?,
            audit_chunk_chars: env_or("AUDIT_CHUNK_CHARS", 1800)?,
        };
        pipeline.validate()?;

        let calls = CallConfig {
            timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 120)?),
            max_retries: env_or("LLM_MAX_RETRIES", 2)?,
            requests_per_minute: env_or("LLM_REQUESTS_PER_MINUTE", 60)?,
        };
        if calls.requests_per_minute == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "LLM_REQUESTS_PER_MINUTE must be positive".into(),
            ));
        }

        Ok(Self {
            provider: provider_from_env()?,
            pipeline,
            calls,
            framework_table: PathBuf::from(env_string("FRAMEWORK_TABLE", "FrameworkData1.csv")),
            data_dir: PathBuf::from(env_string("DATA_DIR", "data")),
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:5000"),
            public_base_url: env_string("PUBLIC_BASE_URL", "http://localhost:5000"),
            signing_secret: std::env::var("SIGNING_SECRET")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().simple().to_string()),
            signed_url_ttl: Duration::from_secs(env_or("SIGNED_URL_TTL_SECS", 1800)?),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
        })
    }
}

fn provider_from_env() -> PipelineResult<ProviderConfig> {
    let kind = env_string("LLM_PROVIDER", "azure").to_lowercase();
    let model = env_string("LLM_MODEL", "gpt-4o");

    match kind.as_str() {
        "azure" => Ok(ProviderConfig::Azure {
            endpoint: required("AZURE_OPENAI_ENDPOINT")?,
            api_key: required("AZURE_OPENAI_KEY")?,
            deployment: required("DEPLOYMENT_NAME")?,
            api_version: env_string("API_VERSION", "2024-02-01"),
        }),
        "openai" => Ok(ProviderConfig::OpenAI {
            base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model,
        }),
        "ollama" => Ok(ProviderConfig::Ollama {
            host: env_string("OLLAMA_HOST", "http://localhost"),
            port: env_or("OLLAMA_PORT", 11434)?,
            model,
        }),
        other => Err(PipelineError::InvalidConfiguration(format!(
            "unknown LLM_PROVIDER '{}' (expected azure, openai or ollama)",
            other
        ))),
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &str) -> PipelineResult<String> {
    std::env::var(key)
        .map_err(|_| PipelineError::InvalidConfiguration(format!("{} is not set", key)))
}

fn env_or<T: FromStr>(key: &str, default: T) -> PipelineResult<T> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            PipelineError::InvalidConfiguration(format!("{} has invalid value '{}'", key, raw))
        }),
        Err(_) => Ok(default),
    }
}
