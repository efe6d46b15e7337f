use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pagewire-cli", version, about = "Pagewire CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted interaction against a page description
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        /// Config file to use instead of the default location
        #[arg(long)]
        file: Option<PathBuf>,
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Inspect and edit the page key-value store
    Storage {
        /// SQLite store to use instead of the default location
        #[arg(long)]
        store: Option<PathBuf>,
        #[command(subcommand)]
        action: commands::storage::StorageAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("PAGEWIRE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { file, action } => commands::config::run(file, action),
        Commands::Storage { store, action } => commands::storage::run(store, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
