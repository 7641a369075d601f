use clap::Parser;
use hotpage::cli::{Cli, Commands, commands};
use hotpage::{Settings, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env is normal outside development
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        if !matches!(cli.command, Commands::Init { .. }) {
            eprintln!("Using default configuration for now.");
        }
        Settings::default()
    });

    logging::init_with_config(&settings.logging);

    if let Err(e) = commands::dispatch(cli.command, &settings).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
