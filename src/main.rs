//! Harmonia - Coordinated Grammatical Slot Decomposition
//!
//! CLI entry point: builds a coordinator with the built-in analyzers and
//! decomposes sentences into grammatical slot assignments, printed as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use harmonia_core::{
    analyzers, config::HarmoniaConfig, coordination::Coordinator, error::Result, AnalysisRequest,
};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "harmonia", version, about = "Coordinated grammatical slot decomposition")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Configuration file (TOML); built-in defaults are used when absent
    #[arg(short, long, env = "HARMONIA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose one sentence and print the unified result as JSON
    Analyze {
        /// Sentence to decompose
        sentence: String,

        /// Attach plan and per-analyzer diagnostics to the result
        #[arg(long)]
        debug: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Decompose one sentence per input line, emitting JSON Lines
    Batch {
        /// Input file with one sentence per line
        input: PathBuf,

        /// Output path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

async fn build_coordinator(config_path: Option<&PathBuf>) -> Result<Coordinator> {
    let config = match config_path {
        Some(path) => HarmoniaConfig::from_file(path)?,
        None => HarmoniaConfig::default(),
    };
    let coordinator = Coordinator::new(config);
    analyzers::register_builtin(coordinator.registry()).await?;
    Ok(coordinator)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::new(format!("harmonia={}", level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Keep stdout clean for JSON output
        .init();

    debug!("Harmonia v{} starting...", env!("CARGO_PKG_VERSION"));

    let coordinator = build_coordinator(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Analyze {
            sentence,
            debug,
            pretty,
        } => {
            let mut request = AnalysisRequest::new(sentence);
            if debug {
                request = request.with_debug();
            }
            let result = coordinator.process(request).await;
            let rendered = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", rendered);
        }

        Commands::Batch { input, output } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read input file {}", input.display()))?;
            let mut lines = Vec::new();
            for sentence in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let result = coordinator.process_sentence(sentence).await;
                lines.push(serde_json::to_string(&result)?);
            }
            debug!("Processed {} sentence(s) from {}", lines.len(), input.display());

            match output {
                Some(path) => std::fs::write(&path, lines.join("\n") + "\n")
                    .with_context(|| format!("Failed to write output to {}", path.display()))?,
                None => {
                    for line in &lines {
                        println!("{}", line);
                    }
                }
            }
        }
    }

    coordinator.shutdown().await?;
    Ok(())
}
