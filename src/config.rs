//! Configuration file parser for ~/.config/newsdigest/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as warnings, since they are usually
//! typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::news::{PromptOptions, DEFAULT_PREFERRED_SOURCES};
use crate::theme::ThemeVariant;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks both API keys.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"dark"`, `"light"` or `"auto"` (follow the terminal). Only used until
    /// the user toggles the theme once; after that the stored choice wins.
    pub theme: String,

    /// Gemini model name.
    pub model: String,

    /// Override for the Gemini API host (HTTPS, or localhost for testing).
    pub api_base_url: Option<String>,

    /// Attach the Google Search grounding tool to requests.
    pub search_grounding: bool,

    /// Pause between revealing consecutive themes.
    pub reveal_interval_ms: u64,

    /// Region the digest covers.
    pub region: String,

    /// Outlets the model should check first. `None` uses the built-in list;
    /// an empty list drops the instruction.
    pub preferred_sources: Option<Vec<String>>,

    /// Prefetch reader content for every story after a refresh.
    pub prefetch: bool,

    /// Gemini API key (`GEMINI_API_KEY` / `API_KEY` env vars take precedence).
    pub gemini_api_key: Option<String>,

    /// Jina reader API key (`JINA_API_KEY` env var takes precedence).
    pub jina_api_key: Option<String>,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "auto".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_base_url: None,
            search_grounding: true,
            reveal_interval_ms: 250,
            region: "Sri Lanka".to_string(),
            preferred_sources: None,
            prefetch: true,
            gemini_api_key: None,
            jina_api_key: None,
            keybindings: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("theme", &self.theme)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("search_grounding", &self.search_grounding)
            .field("reveal_interval_ms", &self.reveal_interval_ms)
            .field("region", &self.region)
            .field("preferred_sources", &self.preferred_sources)
            .field("prefetch", &self.prefetch)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "jina_api_key",
                &self.jina_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

const KNOWN_KEYS: [&str; 11] = [
    "theme",
    "model",
    "api_base_url",
    "search_grounding",
    "reveal_interval_ms",
    "region",
    "preferred_sources",
    "prefetch",
    "gemini_api_key",
    "jina_api_key",
    "keybindings",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing or blank file -> `Ok(Config::default())`
    /// - Invalid TOML or wrong value types -> `Err(ConfigError::Parse)`
    /// - Unknown keys -> accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            theme = %config.theme,
            model = %config.model,
            region = %config.region,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Theme to use when none has been stored yet.
    ///
    /// A config value naming a variant wins; otherwise (including `"auto"`)
    /// the terminal's preference is detected.
    pub fn default_theme(&self) -> ThemeVariant {
        ThemeVariant::from_str_name(&self.theme).unwrap_or_else(ThemeVariant::detect)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            region: self.region.clone(),
            preferred_sources: self.preferred_sources.clone().unwrap_or_else(|| {
                DEFAULT_PREFERRED_SOURCES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
        }
    }

    /// Gemini key from `env` (`GEMINI_API_KEY`, then `API_KEY`) or the file.
    pub fn resolve_gemini_key(&self, env: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or_else(|| self.gemini_api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
    }

    /// Jina key from `env` (`JINA_API_KEY`) or the file.
    pub fn resolve_jina_key(&self, env: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        env("JINA_API_KEY")
            .or_else(|| self.jina_api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
    }
}

/// Process environment lookup for the key resolvers.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ============================================================================
// Tests
// ============================================================================
