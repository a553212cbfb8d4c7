//! Sync CLI commands for synchronizing with the cloud backend.

use clap::{Args, Subcommand};

use crate::config::Config;
use grimoire_core::RecipeRepository;

/// Sync with the cloud backend
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and pending changes
    Status,
}

impl SyncCommand {
    pub async fn run(
        &self,
        repo: &RecipeRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(repo).await,
            Some(SyncSubcommand::Status) => self.status(repo, config).await,
        }
    }

    async fn sync(&self, repo: &RecipeRepository) -> Result<(), Box<dyn std::error::Error>> {
        if !repo.sync_configured() {
            println!("Sync is not configured; nothing to do.");
            println!("Run 'grimoire sync status' for setup instructions.");
            return Ok(());
        }

        println!("Syncing with the cloud backend...");

        let merged = repo.initialize().await?;
        let pending = repo.pending_changes()?;

        println!("  ✓ {} recipe(s) in the grimoire", merged.len());
        if pending.is_empty() {
            println!("  ✓ all changes delivered");
        } else {
            println!(
                "  ✗ {} change(s) still pending - backend unreachable, will retry",
                pending.len()
            );
        }

        Ok(())
    }

    async fn status(
        &self,
        repo: &RecipeRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"http://localhost:3001/api\"");
            println!();
            println!("Or set environment variable:");
            println!("  GRIMOIRE_SYNC_URL");
            return Ok(());
        }

        let server_url = config.sync.server_url.as_deref().unwrap_or_default();

        println!("Server:     {}", server_url);
        println!(
            "Auto-sync:  {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("Polling:    every {}s", config.sync.poll_interval_secs);
        println!("Device:     {}", repo.device_id()?);

        let pending = repo.pending_changes()?;
        if pending.is_empty() {
            println!("Pending:    none");
        } else {
            println!("Pending:    {} change(s)", pending.len());
            for change in &pending {
                println!("  - {} {}", change.action(), change.recipe_id());
            }
        }

        Ok(())
    }
}

/// Performs auto-sync if enabled and configured.
///
/// Pulls remote changes, merges and flushes the pending queue. Failures
/// are reported but never fail the surrounding command - the CLI keeps
/// working offline.
pub async fn try_auto_sync(repo: &RecipeRepository, config: &Config) {
    if !config.sync.auto_sync || !repo.sync_configured() {
        return;
    }

    if let Err(e) = repo.initialize().await {
        eprintln!("Auto-sync: {}", e);
    }
}
