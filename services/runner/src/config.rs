use cdu_core::ErrorPolicy;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported command generator strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    Keyword,
    Llm,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub generator: GeneratorKind,
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub chat_model: String,
    pub error_policy: ErrorPolicy,
    pub max_concurrency: usize,
    pub prompt_template_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let generator_str = std::env::var("GENERATOR").unwrap_or_else(|_| "keyword".to_string());
        let generator = match generator_str.to_lowercase().as_str() {
            "keyword" => GeneratorKind::Keyword,
            "llm" => GeneratorKind::Llm,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "GENERATOR".to_string(),
                    format!("'{}' is not one of 'keyword', 'llm'", generator_str),
                ));
            }
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1/".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let error_policy = std::env::var("ERROR_POLICY")
            .unwrap_or_else(|_| "fail-fast".to_string())
            .parse::<ErrorPolicy>()
            .map_err(|e| ConfigError::InvalidValue("ERROR_POLICY".to_string(), e))?;

        let max_concurrency_str =
            std::env::var("MAX_CONCURRENCY").unwrap_or_else(|_| "1".to_string());
        let max_concurrency = match max_concurrency_str.parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "MAX_CONCURRENCY".to_string(),
                    format!("'{}' is not a positive integer", max_concurrency_str),
                ));
            }
        };

        let prompt_template_path = std::env::var("PROMPT_TEMPLATE_PATH")
            .ok()
            .map(PathBuf::from);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        if generator == GeneratorKind::Llm && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "OPENAI_API_KEY must be set for the 'llm' generator".to_string(),
            ));
        }

        Ok(Self {
            generator,
            openai_api_key,
            openai_api_base,
            chat_model,
            error_policy,
            max_concurrency,
            prompt_template_path,
            log_level,
        })
    }
}
