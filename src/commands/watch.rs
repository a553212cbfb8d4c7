//! Follow remote changes as they arrive.

use std::time::Duration;

use clap::Args;

use crate::config::Config;
use grimoire_core::RecipeRepository;

/// Follow remote changes until interrupted
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Poll interval in seconds (overrides config)
    #[arg(long)]
    interval: Option<u64>,
}

impl WatchCommand {
    pub async fn run(
        &self,
        repo: &RecipeRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !repo.sync_configured() {
            println!("Sync is not configured; nothing to watch.");
            println!("Run 'grimoire sync status' for setup instructions.");
            return Ok(());
        }

        let recipes = repo.initialize().await?;
        println!("Watching the grimoire ({} recipe(s)). Ctrl-C to stop.", recipes.len());

        let _subscription = repo.subscribe(|recipes| {
            println!("✦ grimoire updated: {} recipe(s)", recipes.len());
            for recipe in recipes.iter().take(5) {
                println!("    {} [{}]", recipe.name, recipe.category);
            }
        });

        let interval = self
            .interval
            .unwrap_or(config.sync.poll_interval_secs)
            .max(1);
        let poll = repo.start_polling(Duration::from_secs(interval));

        tokio::signal::ctrl_c().await?;
        poll.stop();
        println!("\nStopped watching.");

        Ok(())
    }
}
