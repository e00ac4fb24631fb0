//! Runtime configuration, assembled once at startup from environment
//! variables and passed by reference to every component that needs it.

use std::path::PathBuf;

use crate::error::{CovgapError, Result};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

/// Which remote analysis backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = CovgapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(CovgapError::Config(format!(
                "LLM_PROVIDER must be 'openai' or 'anthropic', got '{}'",
                other
            ))),
        }
    }
}

/// Resolved configuration for one process.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Optional; search works unauthenticated at a lower rate limit.
    pub github_token: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    /// Where remote repositories are cloned.
    pub repos_dir: PathBuf,
    /// Where analysis reports and transcripts are written.
    pub reports_dir: PathBuf,
}

impl Config {
    /// Build a configuration from environment variables
    /// (`LLM_PROVIDER`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
    /// `GITHUB_TOKEN`, `OPENAI_MODEL`, `ANTHROPIC_MODEL`).
    ///
    /// Fails if the selected provider's API key is missing.
    pub fn from_env() -> Result<Self> {
        let provider = std::env::var("LLM_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse::<Provider>()?;

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        let github_token = std::env::var("GITHUB_TOKEN").ok();

        match provider {
            Provider::OpenAi if openai_api_key.is_none() => {
                return Err(CovgapError::Config(
                    "OPENAI_API_KEY is required when LLM_PROVIDER=openai".to_string(),
                ));
            }
            Provider::Anthropic if anthropic_api_key.is_none() => {
                return Err(CovgapError::Config(
                    "ANTHROPIC_API_KEY is required when LLM_PROVIDER=anthropic".to_string(),
                ));
            }
            _ => {}
        }

        if github_token.is_none() {
            tracing::warn!("GITHUB_TOKEN not set, repository search is rate-limited");
        }

        Ok(Self {
            provider,
            openai_api_key,
            anthropic_api_key,
            github_token,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            repos_dir: PathBuf::from("data/repositories"),
            reports_dir: PathBuf::from("data/reports"),
        })
    }

    /// The model identifier for the selected provider.
    #[must_use]
    pub fn model(&self) -> &str {
        match self.provider {
            Provider::OpenAi => &self.openai_model,
            Provider::Anthropic => &self.anthropic_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("Anthropic".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("gemini".parse::<Provider>().is_err());
    }

    #[test]
    fn test_model_selection() {
        let config = Config {
            provider: Provider::Anthropic,
            openai_api_key: None,
            anthropic_api_key: Some("key".to_string()),
            github_token: None,
            openai_model: "gpt-4o".to_string(),
            anthropic_model: "claude-sonnet-4-5".to_string(),
            repos_dir: PathBuf::from("data/repositories"),
            reports_dir: PathBuf::from("data/reports"),
        };
        assert_eq!(config.model(), "claude-sonnet-4-5");
    }
}
