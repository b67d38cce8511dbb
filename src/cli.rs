//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// leafdoc - diagnose plant leaf diseases from a photo
///
/// Sends a leaf photo to a local vision model, prints the diagnosis and
/// keeps a rolling history of the last 50 results.
///
/// Examples:
///   leafdoc diagnose ./tomato-leaf.jpg
///   leafdoc --model llava:13b diagnose leaf.png --no-save
///   leafdoc stats --format json
///   leafdoc history --limit 5
///   leafdoc history --id 1718000000000
///   leafdoc init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Ollama vision model to use
    ///
    /// Can also be set via LEAFDOC_MODEL env var or .leafdoc.toml config.
    #[arg(short, long, global = true, env = "LEAFDOC_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, global = true, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .leafdoc.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the diagnosis history
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Temperature for model responses (0.0 - 1.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Output format (markdown, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the output to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Diagnose a leaf photo (png, jpeg or webp)
    Diagnose {
        /// Image file to analyze
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Do not add the result to the history
        #[arg(long)]
        no_save: bool,
    },

    /// Show past diagnoses, newest first
    History {
        /// Show at most this many records
        #[arg(long, value_name = "COUNT", conflicts_with = "id")]
        limit: Option<usize>,

        /// Show the full diagnosis of one record
        #[arg(long, value_name = "ID")]
        id: Option<u64>,
    },

    /// Show dashboard statistics over the history
    Stats,

    /// Delete the whole history
    ClearHistory,

    /// List common plant diseases
    Library,

    /// Generate a default .leafdoc.toml configuration file
    InitConfig,
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        match &self.command {
            Command::Diagnose { image, .. } => {
                if !image.is_file() {
                    return Err(format!("Image file does not exist: {}", image.display()));
                }
            }
            Command::History { limit: Some(0), .. } => {
                return Err("Limit must be at least 1".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_diagnose() {
        let args = parse(&["leafdoc", "diagnose", "leaf.jpg", "--no-save"]);
        assert_eq!(
            args.command,
            Command::Diagnose {
                image: PathBuf::from("leaf.jpg"),
                no_save: true,
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["leafdoc", "stats", "--format", "json", "-v"]);
        assert_eq!(args.command, Command::Stats);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.verbose);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["leafdoc"]).is_err());
    }

    #[test]
    fn test_validation_missing_image() {
        let args = parse(&["leafdoc", "diagnose", "/no/such/leaf.png"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let args = parse(&["leafdoc", "--ollama-url", "localhost:11434", "stats"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_history_id() {
        let args = parse(&["leafdoc", "history", "--id", "1718000000000"]);
        assert_eq!(
            args.command,
            Command::History {
                limit: None,
                id: Some(1_718_000_000_000),
            }
        );

        assert!(Args::try_parse_from(["leafdoc", "history", "--id", "1", "--limit", "2"]).is_err());
    }

    #[test]
    fn test_validation_zero_limit() {
        let args = parse(&["leafdoc", "history", "--limit", "0"]);
        assert!(args.validate().is_err());

        let args = parse(&["leafdoc", "history", "--limit", "3"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["leafdoc", "-v", "-q", "stats"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature_and_timeout() {
        let args = parse(&["leafdoc", "--temperature", "1.5", "library"]);
        assert!(args.validate().is_err());

        let args = parse(&["leafdoc", "--timeout", "0", "library"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["leafdoc", "stats"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
