//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.leafdoc.toml` files.

use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".leafdoc.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Image input settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the diagnosis history.
    /// Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Vision model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ollama model name. Must accept image input.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemma3:4b".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    120
}

/// Image input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Largest accepted image, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024 // 10MB
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format when `--format` is not given.
    #[serde(default)]
    pub format: OutputFormat,

    /// Number of records in the dashboard's recent activity list.
    #[serde(default = "default_recent_activity")]
    pub recent_activity: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            recent_activity: default_recent_activity(),
        }
    }
}

fn default_recent_activity() -> usize {
    4
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = Some(data_dir.display().to_string());
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Directory holding the history, falling back to the platform data dir.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.general.data_dir {
            return Ok(PathBuf::from(dir));
        }

        dirs::data_dir()
            .map(|dir| dir.join("leafdoc"))
            .context("Could not determine a data directory; set general.data_dir or --data-dir")
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Command;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "gemma3:4b");
        assert_eq!(config.model.timeout_seconds, 120);
        assert_eq!(config.image.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.report.recent_activity, 4);
        assert!(config.general.data_dir.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_dir = "/var/lib/leafdoc"

[model]
name = "llava:13b"
temperature = 0.3

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_dir.as_deref(), Some("/var/lib/leafdoc"));
        assert_eq!(config.model.name, "llava:13b");
        assert_eq!(config.model.temperature, 0.3);
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.recent_activity, 4);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/var/lib/leafdoc"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[image]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.name, "gemma3:4b");
    }

    #[test]
    fn test_merge_only_overrides_given_args() {
        let mut config = Config::default();
        config.model.name = "llava:13b".to_string();

        let args = Args::parse_from([
            "leafdoc",
            "--timeout",
            "30",
            "--data-dir",
            "/tmp/leafdoc",
            "stats",
        ]);
        assert!(matches!(args.command, Command::Stats));
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "llava:13b");
        assert_eq!(config.model.timeout_seconds, 30);
        assert_eq!(config.general.data_dir.as_deref(), Some("/tmp/leafdoc"));
    }
}
