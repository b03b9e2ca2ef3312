//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the CLI (subcommand + overrides).
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Create the tokio runtime — single-threaded: both pipelines are
//!    cooperative, with at most one network call in flight per stage.
//! 5. Run the selected pipeline to completion.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use transub::asr::JsonlReplaySource;
use transub::config::AppConfig;
use transub::pipeline::{run_batch, run_live};

#[derive(Parser)]
#[command(name = "transub", about = "Speech to time-aligned translated subtitles")]
struct Cli {
    /// Settings file; defaults to the platform config directory.
    #[arg(long, env = "TRANSUB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe and translate a recorded file into an SRT.
    Batch {
        /// Media file (or SRT, with the replay backend).
        input: PathBuf,
        /// Output subtitle file.
        output: PathBuf,
        /// Override the translation model from the settings file.
        #[arg(long, env = "TRANSUB_MODEL")]
        model: Option<String>,
        /// Extra background for the translator (synopsis, names).
        #[arg(long)]
        context: Option<String>,
    },
    /// Replay a JSON-lines word log through the live pipeline.
    Live {
        /// Word log: one `{"start", "end", "text"}` object per line.
        input: PathBuf,
        /// Also write the collected lines as an SRT file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Replay speed factor (2.0 = twice real time).
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    match cli.command {
        Command::Batch {
            input,
            output,
            model,
            context,
        } => {
            if let Some(model) = model {
                config.translation.model = model;
            }
            if let Some(context) = context {
                config.translation.extra_context = context;
            }
            rt.block_on(run_batch(&config, &input, &output))
        }
        Command::Live {
            input,
            output,
            speed,
        } => {
            let source = Box::new(JsonlReplaySource::new(input, speed));
            rt.block_on(run_live(&config, source, output.as_deref()))
        }
    }
}
