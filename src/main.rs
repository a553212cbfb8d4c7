use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod config;
mod enhance;

use commands::{try_auto_sync, ConfigCommand, RecipeCommand, SyncCommand, WatchCommand};
use config::Config;
use grimoire_core::{FileStorage, RecipeRepository, SyncClient};

#[derive(Parser)]
#[command(name = "grimoire")]
#[command(version)]
#[command(about = "An alchemist's recipe grimoire with multi-device sync", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe(RecipeCommand),

    /// Sync with the cloud backend
    Sync(SyncCommand),

    /// Follow remote changes until interrupted
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grimoire=warn".into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_repository(config: &Config) -> RecipeRepository {
    let backend = Arc::new(FileStorage::new(config.data_dir.value.clone()));
    let client = config.sync.server_url.as_deref().map(SyncClient::new);
    RecipeRepository::new(backend, client)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Recipe(cmd)) => {
            let repo = open_repository(&config);

            // Pull before reads so the listing reflects other devices
            if cmd.is_read() {
                try_auto_sync(&repo, &config).await;
            }

            cmd.run(&repo, &config).await?;

            if !cmd.is_read() {
                try_auto_sync(&repo, &config).await;
            }
        }
        Some(Commands::Sync(cmd)) => {
            let repo = open_repository(&config);
            cmd.run(&repo, &config).await?;
        }
        Some(Commands::Watch(cmd)) => {
            let repo = open_repository(&config);
            cmd.run(&repo, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
