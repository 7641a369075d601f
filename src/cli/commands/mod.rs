//! Command implementations for the CLI.

pub mod init;
pub mod serve;
pub mod watch;

use crate::cli::Commands;
use crate::config::Settings;

/// Run `command` with the loaded settings.
pub async fn dispatch(command: Commands, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(settings),
        Commands::Watch => watch::run_watch(settings).await,
        Commands::Serve { watch } => serve::run_serve(settings, watch).await,
    }
}
