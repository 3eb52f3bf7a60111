//! Configuration for planning, writing and context assembly.
//!
//! Configuration is layered:
//! - Bundled defaults (include_str! from scrivener.toml)
//! - User overrides (~/.config/scrivener/scrivener.toml, then ./scrivener.toml)
//! - Later sources override earlier ones key by key

use config::{Config, File, FileFormat};
use scrivener_error::{ConfigError, ScrivenerError, ScrivenerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Completion endpoint and sampling settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,
    /// Top-k cutoff
    pub top_k: Option<u32>,
    /// Stream chapter generations
    pub stream: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: Some(0.8),
            top_p: Some(0.95),
            top_k: None,
            stream: true,
        }
    }
}

impl ApiConfig {
    /// Reads the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the variable is unset or empty.
    pub fn api_key(&self) -> ScrivenerResult<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::new(format!(
                "Environment variable {} is not set",
                self.api_key_env
            ))
            .into()),
        }
    }
}

/// Batch writing settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WritingConfig {
    /// Token budget for a single chapter
    pub max_reply_length: u32,
    /// Retries after the first attempt of a batch
    pub max_retries: u32,
    /// Outline items generated per request
    pub consecutive_chapter_count: usize,
    /// System prompt for chapter generation
    pub system_prompt: String,
    /// Delay between attempts of a failed batch
    pub retry_delay_ms: u64,
    /// Pause between successful batches
    pub batch_pause_ms: u64,
}

impl Default for WritingConfig {
    fn default() -> Self {
        Self {
            max_reply_length: 4096,
            max_retries: 2,
            consecutive_chapter_count: 1,
            system_prompt: "You are a skilled novelist.".to_string(),
            retry_delay_ms: 1000,
            batch_pause_ms: 2000,
        }
    }
}

impl WritingConfig {
    /// Retry backoff as a duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Inter-batch pause as a duration.
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Which chapters count as "the same part of the book" for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScope {
    /// The target's volume, or the unfiled chapters
    #[default]
    CurrentVolume,
    /// The whole novel
    All,
}

/// Prior-chapter context settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Replace older chapters with their summaries
    pub long_text_mode: bool,
    /// Scope for summaries and chapter numbering
    pub context_scope: ContextScope,
    /// Minimum recent chapters kept verbatim
    pub context_chapter_count: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            long_text_mode: false,
            context_scope: ContextScope::CurrentVolume,
            context_chapter_count: 3,
        }
    }
}

/// Top-level Scrivener configuration.
///
/// # Example
///
/// ```no_run
/// use scrivener_automation::ScrivenerConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ScrivenerConfig::load()?;
/// println!("Writing {} chapters per request", config.writing.consecutive_chapter_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ScrivenerConfig {
    /// Completion endpoint
    #[serde(default)]
    pub api: ApiConfig,
    /// Batch writing
    #[serde(default)]
    pub writing: WritingConfig,
    /// Context assembly
    #[serde(default)]
    pub context: ContextConfig,
}

impl ScrivenerConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ScrivenerResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    #[instrument]
    pub fn load() -> ScrivenerResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../scrivener.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/scrivener/scrivener.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("scrivener").required(false));

        builder
            .build()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        const DEFAULT_CONFIG: &str = include_str!("../../../scrivener.toml");
        let config: ScrivenerConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.writing.max_retries, 2);
        assert_eq!(config.writing.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.context.context_scope, ContextScope::CurrentVolume);
        assert!(config.api.stream);
    }

    #[test]
    fn test_from_file_overrides_partial_sections() {
        let path = std::env::temp_dir().join(format!(
            "scrivener-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[writing]\nconsecutive_chapter_count = 3\n\n[context]\ncontext_scope = \"all\"\n",
        )
        .unwrap();

        let config = ScrivenerConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.writing.consecutive_chapter_count, 3);
        assert_eq!(config.writing.max_retries, 2);
        assert_eq!(config.context.context_scope, ContextScope::All);
        assert_eq!(config.api.model, "gpt-4o-mini");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let api = ApiConfig {
            api_key_env: "SCRIVENER_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(api.api_key().is_err());
    }
}
