// config.rs - Environment configuration, resolved once before the run starts
use crate::arxiv_client::DEFAULT_ARXIV_URL;
use crate::error::ConfigError;
use crate::openai_client::{DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    /// Video retrieval degrades to a failure event when this is absent
    pub youtube_api_key: Option<String>,
    pub arxiv_api_url: String,
    pub stage_timeout: Duration,
    pub output_dir: PathBuf,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let openai_api_key = var("OPENAI_API_KEY").ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;

        Ok(Self {
            openai_api_key,
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_temperature: parse_or("OPENAI_TEMPERATURE", var("OPENAI_TEMPERATURE"), 0.7)?,
            youtube_api_key: var("YOUTUBE_API_KEY"),
            arxiv_api_url: var("ARXIV_API_URL").unwrap_or_else(|| DEFAULT_ARXIV_URL.to_string()),
            stage_timeout: Duration::from_secs(parse_or("STAGE_TIMEOUT_SECS", var("STAGE_TIMEOUT_SECS"), 120u64)?),
            output_dir: var("RESEARCH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[("YOUTUBE_API_KEY", "yt")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("OPENAI_API_KEY")));

        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.arxiv_api_url, DEFAULT_ARXIV_URL);
        assert_eq!(config.stage_timeout, Duration::from_secs(120));
        assert!(config.youtube_api_key.is_none());
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("STAGE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "STAGE_TIMEOUT_SECS", .. }));
    }
}
