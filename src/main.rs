//! treewatch - run a command whenever a watched directory tree changes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use treewatch::action::ActionDispatcher;
use treewatch::config::{Config, ConfigLoader};
use treewatch::watcher::{TreeWatcher, WatcherError};

#[derive(Parser)]
#[command(
    name = "treewatch",
    about = "Run a command whenever a watched directory tree changes",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured directories and run actions on change.
    Run {
        /// Config file path.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate the configuration and exit.
    Check {
        /// Config file path.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn loader_for(config: Option<PathBuf>) -> ConfigLoader {
    config.map_or_else(ConfigLoader::new, ConfigLoader::with_path)
}

/// Spawn one watcher per monitor and run the dispatcher.
///
/// Returns only if every watcher thread dies; in normal operation this
/// runs until the process is externally terminated.
async fn watch(config: Config) -> Result<(), WatcherError> {
    let (actions, dispatcher) = ActionDispatcher::new();

    let mut watchers = Vec::with_capacity(config.monitor.len());
    for monitor in config.monitor {
        tracing::info!(directory = %monitor.directory.display(), "Starting monitor");
        watchers.push(TreeWatcher::spawn(monitor, actions.clone())?);
    }
    // The watcher threads hold the remaining senders.
    drop(actions);

    dispatcher.run().await;
    for handle in watchers {
        let _ = handle.join();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config } => {
            let config = match loader_for(config).load() {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(error = %e, "Configuration error");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = watch(config).await {
                tracing::error!(error = %e, "Unable to start watching");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Check { config } => match loader_for(config).load() {
            Ok(config) => {
                println!("Configuration OK: {} monitor(s)", config.monitor.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration error");
                ExitCode::FAILURE
            }
        },
    }
}
