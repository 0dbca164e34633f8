//! Pathwise CLI: the main entry point.
//!
//! Commands:
//! - `serve` - Start the HTTP API server
//! - `chat` - Interactive or single-message chat
//! - `history` - Print a session's turns
//! - `seed` - Load the college/branch catalog
//! - `config` - Show, locate, validate or initialize configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pathwise",
    about = "Pathwise: career guidance assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.pathwise/config.toml
    #[arg(short, long, global = true, env = "PATHWISE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with the career counselor
    Chat {
        /// Session to append to (a new one is created if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the turns of a session, oldest first
    History {
        /// Session identifier
        session: String,

        /// Print raw JSON instead of a transcript
        #[arg(long)]
        json: bool,
    },

    /// Replace the catalog with a seed file (or the built-in catalog)
    Seed {
        /// TOML seed file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Check the configuration for problems
    Validate,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Chat { session, message } => {
            commands::chat::run(config_path, session, message).await?
        }
        Commands::History { session, json } => {
            commands::history::run(config_path, &session, json).await?
        }
        Commands::Seed { file } => commands::seed::run(config_path, file).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Init => commands::config_cmd::init(config_path).await?,
        },
    }

    Ok(())
}
