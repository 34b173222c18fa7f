//! Configuration file management for lessonkit.
//!
//! Provides a TOML-based config file at `~/.config/lessonkit/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lessonkit_core::export::DEFAULT_PREFIX;
use lessonkit_core::generation::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use lessonkit_core::generation::{GeminiClient, GeminiSettings};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub export: ExportSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            output_dir: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the lessonkit config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/lessonkit` or
/// `~/.config/lessonkit`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("lessonkit");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("lessonkit")
}

/// Return the path to the lessonkit config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file if it exists. A missing file is not an error; a
/// malformed one is.
pub fn load_optional_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    write_config_text(&config_path(), &contents)
}

/// Write raw config text to `path` with owner-only permissions on Unix.
pub fn write_config_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` falls through to the next
/// source in the chain.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub gemini: GeminiSettings,
    /// Where the API key came from, for `config show`.
    pub api_key_source: Option<&'static str>,
    pub export_prefix: String,
    pub output_dir: PathBuf,
}

impl ResolvedConfig {
    /// Resolve against the config file on disk.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let file = load_optional_config()?;
        Ok(Self::resolve_with(overrides, file))
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `--api-key` > `LESSONKIT_API_KEY` > `GEMINI_API_KEY` > `generation.api_key` > none
    /// - Model: `--model` > `LESSONKIT_MODEL` > `generation.model` > [`DEFAULT_MODEL`]
    /// - Output dir: `--output-dir` > `export.output_dir` > current directory
    pub fn resolve_with(overrides: &Overrides, file: Option<ConfigFile>) -> Self {
        let file = file.unwrap_or_default();

        let (api_key, api_key_source) = if let Some(key) = non_blank(overrides.api_key.clone()) {
            (Some(key), Some("--api-key"))
        } else if let Some(key) = env_non_blank("LESSONKIT_API_KEY") {
            (Some(key), Some("LESSONKIT_API_KEY"))
        } else if let Some(key) = env_non_blank("GEMINI_API_KEY") {
            (Some(key), Some("GEMINI_API_KEY"))
        } else if let Some(key) = non_blank(file.generation.api_key) {
            (Some(key), Some("config file"))
        } else {
            (None, None)
        };

        let model = non_blank(overrides.model.clone())
            .or_else(|| env_non_blank("LESSONKIT_MODEL"))
            .or_else(|| non_blank(Some(file.generation.model)))
            .unwrap_or_else(default_model);

        let output_dir = overrides
            .output_dir
            .clone()
            .or(file.export.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let export_prefix = non_blank(Some(file.export.prefix)).unwrap_or_else(default_prefix);

        Self {
            gemini: GeminiSettings {
                api_key,
                model,
                base_url: file.generation.base_url,
                timeout: Duration::from_secs(file.generation.timeout_secs),
                temperature: file.generation.temperature,
            },
            api_key_source,
            export_prefix,
            output_dir,
        }
    }

    /// Build the Gemini client for these settings.
    pub fn client(&self) -> Result<GeminiClient> {
        GeminiClient::new(self.gemini.clone()).context("failed to build Gemini HTTP client")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_non_blank(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
