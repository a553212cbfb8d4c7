mod config_cmd;
mod recipe;
mod sync_cmd;
mod watch;

pub use config_cmd::ConfigCommand;
pub use recipe::RecipeCommand;
pub use sync_cmd::{try_auto_sync, SyncCommand};
pub use watch::WatchCommand;
