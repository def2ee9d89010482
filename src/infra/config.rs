// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::BridgeError;
use crate::infra::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Prompt language used when a character profile does not override it.
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Raise the log level to debug.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub hooks: HooksConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            paths: PathsConfig::default(),
            default_lang: default_lang(),
            debug: false,
            hooks: HooksConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

fn default_lang() -> String {
    "zh".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9881,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Fail the audio stream instead of emitting the backend error body as audio bytes.
    #[serde(default)]
    pub strict_stream_errors: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9880".into(),
            connect_timeout_secs: 10,
            timeout_secs: 120,
            strict_stream_errors: false,
        }
    }
}

impl BackendConfig {
    /// Backend base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory that relative paths resolve against. Defaults to the
    /// config file's directory, or the working directory without one.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    pub ref_audio_dir: PathBuf,
    pub output_dir: PathBuf,
    pub models_config: PathBuf,
    /// Optional directory of plugin descriptors (`<name>/plugin.toml`).
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            ref_audio_dir: "voice".into(),
            output_dir: "output".into(),
            models_config: "models.json".into(),
            plugins_dir: None,
        }
    }
}

impl PathsConfig {
    pub fn base(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base().join(path)
        }
    }

    pub fn ref_audio_dir(&self) -> PathBuf {
        self.resolve(&self.ref_audio_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    pub fn models_config(&self) -> PathBuf {
        self.resolve(&self.models_config)
    }

    pub fn plugins_dir(&self) -> Option<PathBuf> {
        self.plugins_dir.as_deref().map(|p| self.resolve(p))
    }
}

/// What to do when the same hook identifier is registered twice at one point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep both registrations; both run.
    #[default]
    Allow,
    /// Ignore the later registration.
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub clean_text: CleanTextConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanTextConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CleanTextConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Empty disables translation without unregistering the hook.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_translate_model")]
    pub model: String,
    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_api_key(),
            api_url: default_api_url(),
            model: default_translate_model(),
            timeout_secs: default_translate_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_key() -> String {
    std::env::var("SILICONFLOW_API_KEY").unwrap_or_default()
}

fn default_api_url() -> String {
    std::env::var("SILICONFLOW_API_URL")
        .unwrap_or_else(|_| "https://api.siliconflow.cn/v1/chat/completions".into())
}

fn default_translate_model() -> String {
    std::env::var("SILICONFLOW_MODEL").unwrap_or_else(|_| "Qwen/Qwen2.5-14B-Instruct".into())
}

fn default_translate_timeout() -> u64 {
    10
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.3
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if config.paths.base_dir.is_none() {
            config.paths.base_dir = path.parent().map(Path::to_path_buf);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, per request.
    pub fn validate(&self) -> Result<(), BridgeError> {
        let parsed = url::Url::parse(self.backend.base_url())
            .map_err(|e| BridgeError::Config(format!("invalid backend url '{}': {e}", self.backend.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BridgeError::Config(format!(
                "backend url must be http(s), got '{}'",
                parsed.scheme()
            )));
        }
        if self.default_lang.trim().is_empty() {
            return Err(BridgeError::Config("default_lang cannot be empty".into()));
        }
        Ok(())
    }

    /// Log level implied by the `debug` flag.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
