//! Configuration management for Scout.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults
//! - Config file (`SCOUT_CONFIG` or `.scout/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Provider names are kept as plain strings here. Whether a name is actually
//! supported is decided by the LLM router at call time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Provider used when neither the request nor the environment names one.
pub const DEFAULT_PROVIDER: &str = "openai";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Alternative provider names and the canonical name each one stands for.
pub const PROVIDER_ALIASES: &[(&str, &str)] = &[("google", "gemini")];

/// Canonical form of a provider name: trimmed, lowercased, aliases folded.
pub fn canonical_provider_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    PROVIDER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

fn aliases_of(canonical: &str) -> impl Iterator<Item = &'static str> + '_ {
    PROVIDER_ALIASES
        .iter()
        .filter(move |(_, target)| *target == canonical)
        .map(|(alias, _)| *alias)
}

fn env_prefix(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".scout/config.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format ("text" or "json")
    pub log_format: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider settings
    pub llm: LlmSettings,
}

/// LLM settings: default provider, per-provider connection settings and
/// the model capability table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider used when a request does not name one
    pub default_provider: String,

    /// Connection settings keyed by provider name
    pub providers: HashMap<String, ProviderSettings>,

    /// Explicit per-model capability flags
    #[serde(default)]
    pub models: HashMap<String, ModelSettings>,

    /// Name patterns that classify a model as a reasoning model
    #[serde(default)]
    pub reasoning_markers: ReasoningMarkers,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let mut providers = HashMap::new();

        providers.insert(
            "openai".to_string(),
            ProviderSettings {
                api_key: None,
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                base_url: Some(DEFAULT_OPENAI_BASE_URL.to_string()),
                model: Some(DEFAULT_OPENAI_MODEL.to_string()),
            },
        );

        providers.insert(
            "gemini".to_string(),
            ProviderSettings {
                api_key: None,
                api_key_env: Some("GEMINI_API_KEY".to_string()),
                base_url: Some(DEFAULT_GEMINI_BASE_URL.to_string()),
                model: Some(DEFAULT_GEMINI_MODEL.to_string()),
            },
        );

        Self {
            default_provider: DEFAULT_PROVIDER.to_string(),
            providers,
            models: HashMap::new(),
            reasoning_markers: ReasoningMarkers::default(),
        }
    }
}

impl LlmSettings {
    /// Settings for a provider, or empty settings if none are configured.
    ///
    /// Entries stored under an alias (`google`) are overlaid onto the
    /// canonical entry (`gemini`).
    pub fn provider(&self, name: &str) -> ProviderSettings {
        let canonical = canonical_provider_name(name);
        let mut settings = self.providers.get(&canonical).cloned().unwrap_or_default();
        for alias in aliases_of(&canonical) {
            if let Some(aliased) = self.providers.get(alias) {
                settings.merge(aliased.clone());
            }
        }
        settings
    }
}

/// Connection settings for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Literal API key. Prefer `api_key_env` in files.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default model for this provider
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderSettings {
    /// Overlay `other` onto `self`; fields set in `other` win.
    pub fn merge(&mut self, other: ProviderSettings) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.api_key_env.is_some() {
            self.api_key_env = other.api_key_env;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
    }

    /// Resolve the API key from the process environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key: explicit key first, then the named variable.
    /// Empty values count as absent.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }

        self.api_key_env
            .as_deref()
            .and_then(lookup)
            .filter(|k| !k.trim().is_empty())
    }
}

/// Capability flags for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    /// Model accepts reasoning-effort controls
    #[serde(default)]
    pub reasoning: bool,
}

/// Name patterns for models without an explicit table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningMarkers {
    /// Model names starting with any of these are reasoning models
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Model names carrying any of these as a `-` segment after the first
    /// are reasoning models
    #[serde(default)]
    pub suffixes: Vec<String>,
}

impl Default for ReasoningMarkers {
    fn default() -> Self {
        Self {
            prefixes: ["gpt-5", "o1", "o3", "o4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            suffixes: vec!["thinking".to_string()],
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmFileSection {
    default_provider: Option<String>,
    #[serde(default)]
    providers: HashMap<String, ProviderSettings>,
    #[serde(default)]
    models: HashMap<String, ModelSettings>,
    reasoning_markers: Option<ReasoningMarkers>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    format: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            log_level: None,
            log_format: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `SCOUT_CONFIG`: Path to config file
    /// - `SCOUT_PROVIDER`: Default LLM provider
    /// - `SCOUT_LOG_FORMAT`: Log line format
    /// - `<PROVIDER>_BASE_URL`, `<PROVIDER>_MODEL`: e.g. `OPENAI_MODEL`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// API keys are read at client construction from the variable named by
    /// each provider's `apiKeyEnv` (`OPENAI_API_KEY`, `GEMINI_API_KEY`).
    ///
    /// # Example
    /// ```no_run
    /// use scout_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Default provider: {}", config.llm.default_provider);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(std::env::var("SCOUT_CONFIG").ok().map(PathBuf::from))
    }

    /// Load configuration using an explicit config file path.
    ///
    /// An explicit path that does not exist is an error; the default
    /// `.scout/config.yaml` is only merged when present.
    pub fn load_from(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    config.merge_yaml(&path)?;
                }
            }
        }

        config.apply_env_with(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Merge YAML configuration text into this config.
    pub fn merge_yaml_str(&mut self, contents: &str) -> AppResult<()> {
        // An empty document deserializes to unit, not to a struct.
        if contents.trim().is_empty() {
            return Ok(());
        }

        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                self.log_format = Some(format);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.default_provider {
                self.llm.default_provider = provider;
            }

            for (name, settings) in llm.providers {
                self.llm
                    .providers
                    .entry(canonical_provider_name(&name))
                    .or_default()
                    .merge(settings);
            }

            self.llm.models.extend(llm.models);

            if let Some(markers) = llm.reasoning_markers {
                self.llm.reasoning_markers = markers;
            }
        }

        Ok(())
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("SCOUT_PROVIDER").filter(|p| !p.is_empty()) {
            self.llm.default_provider = provider;
        }

        for (name, settings) in self.llm.providers.iter_mut() {
            // Alias variables first so the canonical variable wins
            let mut prefixes: Vec<String> = aliases_of(name).map(env_prefix).collect();
            prefixes.push(env_prefix(name));

            for prefix in prefixes {
                if let Some(base_url) = lookup(&format!("{}_BASE_URL", prefix)) {
                    settings.base_url = Some(base_url);
                }
                if let Some(model) = lookup(&format!("{}_MODEL", prefix)) {
                    settings.model = Some(model);
                }
            }
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if let Some(format) = lookup("SCOUT_LOG_FORMAT") {
            self.log_format = Some(format);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over file and environment values.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        log_level: Option<String>,
        log_format: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.default_provider = provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.log_format = Some(log_format);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate provider connection settings.
    ///
    /// The default provider name is resolved per request, not here.
    pub fn validate(&self) -> AppResult<()> {
        for (name, settings) in &self.llm.providers {
            if let Some(ref base_url) = settings.base_url {
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(AppError::Config(format!(
                        "Invalid base URL for provider '{}': {}",
                        name, base_url
                    )));
                }
            }

            if let Some(ref model) = settings.model {
                if model.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "Empty default model for provider '{}'",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}
