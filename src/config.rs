//! Configuration loader and validator. All settings come from the process
//! environment; missing required credentials abort before any customer is
//! processed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

const DEFAULT_DATABASE_URL: &str = "sqlite://data/draftbot.db";
const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPLATE_CODE: &str = "weekly_drafts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    /// Base URL the confirmation links are built from.
    pub service_url: String,
    pub openai: OpenAi,
    pub sens: Sens,
}

/// Generation collaborator credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAi {
    pub api_key: String,
    pub model: String,
}

/// Delivery collaborator credentials (NCP SENS alimtalk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sens {
    pub access_key: String,
    pub secret_key: String,
    pub service_id: String,
    pub channel_id: String,
    pub template_code: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    fn load_with(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &'static str, default: &str| -> String {
            match get(key) {
                Some(v) if !v.trim().is_empty() => v,
                _ => default.to_string(),
            }
        };
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        let cfg = Config {
            database_url: optional("DATABASE_URL", DEFAULT_DATABASE_URL),
            service_url: optional("SERVICE_URL", DEFAULT_SERVICE_URL),
            openai: OpenAi {
                api_key: required("OPENAI_API_KEY")?,
                model: optional("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            },
            sens: Sens {
                access_key: required("NCP_ACCESS_KEY")?,
                secret_key: required("NCP_SECRET_KEY")?,
                service_id: required("NCP_SERVICE_ID")?,
                channel_id: required("KAKAO_CHANNEL_ID")?,
                template_code: optional("ALIMTALK_TEMPLATE_CODE", DEFAULT_TEMPLATE_CODE),
            },
        };
        validate(&cfg)?;
        Ok(cfg)
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !cfg.service_url.starts_with("http://") && !cfg.service_url.starts_with("https://") {
        return Err(ConfigError::Invalid("SERVICE_URL must be an http(s) URL"));
    }
    if !cfg.database_url.starts_with("sqlite:") {
        return Err(ConfigError::Invalid("DATABASE_URL must be a sqlite:// URL"));
    }
    Ok(())
}
