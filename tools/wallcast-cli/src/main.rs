//! Wallcast CLI: video-wall broadcast assembly and supervision.
//!
//! Usage:
//!   wallcast confcheck             Check configuration and exit
//!   wallcast run -l <LAYOUT>       Validate the layout, then run the wall

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use wallcast_common::config::WallConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "wallcast",
    about = "Multi-camera video wall with per-channel loudness meters",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration and exit (0 = usable, 1 = not)
    Confcheck,

    /// Run the video wall until externally terminated
    Run {
        /// Path to the layout file (relative paths resolve against base_dir)
        #[arg(short, long)]
        layout: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match WallConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("<ERROR> {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    wallcast_common::logging::init_logging(&logging);

    let result = match cli.command {
        Commands::Confcheck => commands::confcheck::run(&config).await,
        Commands::Run { layout } => commands::run::run(&config, &layout).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("<ERROR> {e:#}");
            ExitCode::FAILURE
        }
    }
}
