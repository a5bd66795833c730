use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::db::Database;
use crate::duplicate::DuplicateConfig;
use crate::error::PipelineError;
use crate::extract::{Extractor, DEFAULT_LLM_TIMEOUT, DEFAULT_RATE_LIMIT};
use crate::import::Importer;
use crate::normalize::aliases::DEFAULT_CITY;
use crate::normalize::Normalizer;
use crate::{LLMClient, LLMParams};

const DEFAULT_DATABASE_PATH: &str = "propintake.db";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "llama3.1";

/// Reads an environment variable and parses it, falling back to `default`
/// when the variable is unset or unparseable.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}", var, value);
                default
            }
        },
        Err(_) => default,
    }
}

/// Runtime settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_path: String,
    pub port: u16,
    pub llm: Option<LLMParams>,
    pub rate_limit: Duration,
    pub llm_timeout: Duration,
    pub duplicate_threshold: f64,
    pub default_city: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, PipelineError> {
        let settings = Settings {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            port: get_env_var_or("PORT", DEFAULT_PORT),
            llm: llm_params_from_env()?,
            rate_limit: Duration::from_secs(get_env_var_or(
                "LLM_RATE_LIMIT_SECS",
                DEFAULT_RATE_LIMIT.as_secs(),
            )),
            llm_timeout: Duration::from_secs(get_env_var_or(
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT.as_secs(),
            )),
            duplicate_threshold: get_env_var_or(
                "DUPLICATE_THRESHOLD",
                DuplicateConfig::default().duplicate_threshold,
            ),
            default_city: env::var("DEFAULT_CITY").unwrap_or_else(|_| DEFAULT_CITY.to_string()),
        };

        if !(0.0..=1.0).contains(&settings.duplicate_threshold) {
            return Err(PipelineError::Config {
                message: format!(
                    "DUPLICATE_THRESHOLD must be between 0 and 1, got {}",
                    settings.duplicate_threshold
                ),
            });
        }

        Ok(settings)
    }

    /// Settings with the LLM fallback switched off.
    pub fn without_llm(mut self) -> Self {
        self.llm = None;
        self
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.llm.clone())
            .with_rate_limit(self.rate_limit)
            .with_llm_timeout(self.llm_timeout)
            .with_default_city(&self.default_city)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new().with_default_city(&self.default_city)
    }

    pub fn duplicate_config(&self) -> DuplicateConfig {
        DuplicateConfig::default().with_threshold(self.duplicate_threshold)
    }

    pub fn importer(&self, db: Database) -> Importer {
        Importer::new(db, self.extractor())
            .with_normalizer(self.normalizer())
            .with_duplicate_config(self.duplicate_config())
    }
}

/// Build the LLM client named by `LLM_PROVIDER` (`ollama`, `openai` or
/// `none`).
fn llm_params_from_env() -> Result<Option<LLMParams>, PipelineError> {
    let provider = env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string());
    let model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let temperature = get_env_var_or("LLM_TEMPERATURE", 0.0f32);

    let llm_client = match provider.trim().to_lowercase().as_str() {
        "none" | "" => {
            info!("LLM extraction disabled");
            return Ok(None);
        }
        "openai" => {
            let api_key = env::var("OPENAI_API_KEY").map_err(|_| PipelineError::Config {
                message: "OPENAI_API_KEY must be set when LLM_PROVIDER=openai".to_string(),
            })?;
            let config = OpenAIConfig::new().with_api_key(api_key);
            LLMClient::OpenAI(OpenAIClient::with_config(config))
        }
        "ollama" => {
            let host =
                env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
            let port = get_env_var_or("OLLAMA_PORT", DEFAULT_OLLAMA_PORT);
            let host = ollama_base_url(&host)?;
            info!("Connecting to Ollama at {}:{}", host, port);
            LLMClient::Ollama(Ollama::new(host, port))
        }
        other => {
            return Err(PipelineError::Config {
                message: format!("Unknown LLM_PROVIDER '{}'", other),
            })
        }
    };

    info!("Using model: {} with temperature: {}", model, temperature);
    Ok(Some(LLMParams {
        llm_client,
        model,
        temperature,
    }))
}

/// Scheme and host of `OLLAMA_HOST`, defaulting the scheme to http. Any
/// port in the value is dropped in favour of `OLLAMA_PORT`.
fn ollama_base_url(host: &str) -> Result<String, PipelineError> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| PipelineError::Config {
        message: format!("Invalid OLLAMA_HOST '{}': {}", host, e),
    })?;
    let host_name = parsed.host_str().ok_or_else(|| PipelineError::Config {
        message: format!("OLLAMA_HOST '{}' has no host", host),
    })?;

    Ok(format!("{}://{}", parsed.scheme(), host_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_base_url() {
        assert_eq!(ollama_base_url("localhost").unwrap(), "http://localhost");
        assert_eq!(
            ollama_base_url("https://gpu-box:11434").unwrap(),
            "https://gpu-box"
        );
        assert!(ollama_base_url("http://").is_err());
    }

    #[test]
    fn test_get_env_var_or_defaults() {
        assert_eq!(get_env_var_or("PROPINTAKE_TEST_UNSET_VAR", 42u16), 42);
    }
}
