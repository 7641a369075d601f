//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ hotpage init                # Write .hotpage/settings.toml
  $ hotpage watch               # Push template edits into the database
  $ hotpage serve --watch       # Serve the site and push edits live";

#[derive(Parser, Debug)]
#[command(
    name = "hotpage",
    version,
    about = "Live template editing for a database-backed site",
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to a settings file (defaults to .hotpage/settings.toml)
    #[arg(short, long, global = true, env = "HOTPAGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up .hotpage directory
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Serve the site, following database changes
    Serve {
        /// Also watch the template directory and persist edits
        #[arg(short, long)]
        watch: bool,
    },

    /// Watch the template directory and persist edits
    Watch,

    /// Display active settings
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_watch_and_config() {
        let cli = Cli::try_parse_from(["hotpage", "serve", "--watch", "--config", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { watch: true }));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
