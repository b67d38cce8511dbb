//! leafdoc - plant leaf disease diagnosis from a photo
//!
//! A CLI tool that sends leaf photos to a local Ollama vision model,
//! prints a structured diagnosis and keeps a rolling history used for
//! dashboard statistics.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid image, connection, model failure, etc.)

mod analysis;
mod cli;
mod config;
mod encoding;
mod history;
mod inference;
mod models;
mod report;
mod storage;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::Config;
use history::HistoryStore;
use indicatif::{ProgressBar, ProgressStyle};
use inference::{DiagnosisClient, InferenceConfig};
use std::path::Path;
use std::time::Duration;
use storage::{FileStore, KeyValueStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command == Command::InitConfig {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("leafdoc v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .leafdoc.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, data directory and report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the selected subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    let format = config.report.format;

    match &args.command {
        Command::Diagnose { image, no_save } => {
            let output = diagnose(&config, &args, image, *no_save).await?;
            emit(&output, &args)
        }
        Command::History { limit, id } => {
            let store = open_history(&config)?;
            let output = render_history(&store, *limit, *id, format)?;
            emit(&output, &args)
        }
        Command::Stats => {
            let store = open_history(&config)?;
            let history = store.get_history();

            let stats = analysis::compute_stats(&history);
            let ranked = analysis::rank_diseases(&history);
            debug!("{}", analysis::generate_summary_text(&stats, &ranked));

            let dashboard = report::Dashboard::new(
                stats,
                ranked,
                analysis::recent_activity(&history, config.report.recent_activity),
            );

            let output = match format {
                OutputFormat::Json => report::generate_json(&dashboard)?,
                OutputFormat::Markdown => report::generate_dashboard_markdown(&dashboard),
            };
            emit(&output, &args)
        }
        Command::ClearHistory => {
            let mut store = open_history(&config)?;
            store.clear_history();
            if !args.quiet {
                println!("🗑️  History cleared.");
            }
            Ok(())
        }
        Command::Library => {
            let client = DiagnosisClient::new(inference_config(&config))?;
            let spinner = spinner(&args, "Loading the disease library...");
            let diseases = client
                .common_diseases()
                .await
                .context("Failed to load the disease library. The model could not process the request.");
            spinner.finish_and_clear();
            let diseases = diseases?;

            let output = match format {
                OutputFormat::Json => report::generate_json(&diseases)?,
                OutputFormat::Markdown => report::generate_library_markdown(&diseases),
            };
            emit(&output, &args)
        }
        Command::InitConfig => handle_init_config(),
    }
}

/// Diagnose one image and, unless disabled, record it in the history.
async fn diagnose(config: &Config, args: &Args, image: &Path, no_save: bool) -> Result<String> {
    let data_url = encoding::file_to_data_url(image, config.image.max_bytes)?;
    let (mime, payload) = encoding::split_data_url(&data_url)?;
    info!("Encoded {} as {}", image.display(), mime);

    let client = DiagnosisClient::new(inference_config(config))?;

    let spinner = spinner(args, &format!("Analyzing {} with {}...", image.display(), config.model.name));
    let result = client
        .analyze(payload, mime)
        .await
        .context("Failed to analyze the plant leaf. The model could not process the request.");
    spinner.finish_and_clear();
    let diagnosis = result?;

    // History is best effort; a missing data dir must not hide the diagnosis.
    let record_id = if no_save {
        None
    } else {
        match open_history(config) {
            Ok(mut store) => Some(store.add_to_history(data_url.clone(), diagnosis.clone()).id),
            Err(e) => {
                warn!("History unavailable, result not saved: {:#}", e);
                None
            }
        }
    };

    Ok(match config.report.format {
        OutputFormat::Json => report::generate_json(&diagnosis)?,
        OutputFormat::Markdown => report::generate_diagnosis_markdown(&diagnosis, record_id),
    })
}

/// Render the history list, or a single record when `id` is given.
fn render_history<S: KeyValueStore>(
    store: &HistoryStore<S>,
    limit: Option<usize>,
    id: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    if let Some(id) = id {
        let record = store
            .get_record(id)
            .with_context(|| format!("No diagnosis with id {} in history", id))?;
        return Ok(match format {
            OutputFormat::Json => report::generate_json(&record)?,
            OutputFormat::Markdown => report::generate_record_markdown(&record),
        });
    }

    let mut history = store.get_history();
    if let Some(limit) = limit {
        history.truncate(limit);
    }

    Ok(match format {
        OutputFormat::Json => report::generate_json(&history)?,
        OutputFormat::Markdown => report::generate_history_markdown(&history),
    })
}

/// Print output or write it to --output.
fn emit(content: &str, args: &Args) -> Result<()> {
    match args.output {
        Some(ref path) => {
            report::write_output(content, path)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Saved to: {}", path.display());
            }
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn spinner(args: &Args, message: &str) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn inference_config(config: &Config) -> InferenceConfig {
    InferenceConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    }
}

fn open_history(config: &Config) -> Result<HistoryStore<FileStore>> {
    let data_dir = config.data_dir()?;
    debug!("History directory: {}", data_dir.display());
    Ok(HistoryStore::new(FileStore::new(data_dir)))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
