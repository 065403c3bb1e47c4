//! vapmod - V.A Proxy speedrun mod installer
//!
//! Installs BepInEx plugins and SpeedrunningUtils split files listed in the
//! community mod manifest.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vapmod_core::config::{PathStore, Settings};

mod mods_cli;

use mods_cli::{CliContext, PathCommand};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "vapmod",
    about = "Install speedrunning mods and splits for V.A Proxy",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override the settings file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Override the manifest URL from settings
    #[clap(long, global = true)]
    manifest_url: Option<String>,
}

#[derive(Parser, Debug)]
enum Command {
    /// List available mods and splits
    List {
        /// V.A Proxy root folder (defaults to the saved one)
        #[clap(long)]
        root: Option<PathBuf>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Install selected mods and splits
    Install {
        /// V.A Proxy root folder (defaults to the saved one)
        #[clap(long)]
        root: Option<PathBuf>,

        /// Mod to install (repeatable)
        #[clap(long = "mod", value_name = "NAME")]
        mods: Vec<String>,

        /// Split to install (repeatable)
        #[clap(long = "split", value_name = "NAME")]
        splits: Vec<String>,
    },

    /// Install BepInEx from the packaged archive
    Bootstrap {
        /// V.A Proxy root folder (defaults to the saved one)
        #[clap(long)]
        root: Option<PathBuf>,

        /// BepInEx pack (.tar.gz)
        #[clap(long)]
        archive: Option<PathBuf>,
    },

    /// Show or change the saved root folder
    Path {
        #[clap(subcommand)]
        command: PathCommand,
    },
}

fn initialize_tracing(log_level: &LogLevel) {
    // RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout is reserved for command output
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };
    if let Some(url) = cli.manifest_url {
        settings.manifest_url = url;
    }

    let context = CliContext::new(settings, PathStore::open_default()?);

    match cli.command {
        Command::List { root, json } => mods_cli::execute_list(&context, root, json).await,
        Command::Install { root, mods, splits } => {
            mods_cli::execute_install(&context, root, mods, splits).await
        }
        Command::Bootstrap { root, archive } => mods_cli::execute_bootstrap(&context, root, archive),
        Command::Path { command } => mods_cli::execute_path(&context, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "vapmod",
            "install",
            "--root",
            "/games/vaproxy",
            "--mod",
            "Speedrun Timer",
            "--mod",
            "Practice Tools",
            "--split",
            "Any%",
        ])
        .unwrap();

        match cli.command {
            Command::Install { root, mods, splits } => {
                assert_eq!(root, Some(PathBuf::from("/games/vaproxy")));
                assert_eq!(mods, vec!["Speedrun Timer", "Practice Tools"]);
                assert_eq!(splits, vec!["Any%"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vapmod",
            "list",
            "--json",
            "--log-level",
            "debug",
            "--manifest-url",
            "https://example.com/mods.txt",
        ])
        .unwrap();

        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert_eq!(cli.manifest_url.as_deref(), Some("https://example.com/mods.txt"));
        assert!(matches!(cli.command, Command::List { json: true, .. }));
    }

    #[test]
    fn test_path_set_requires_argument() {
        assert!(Cli::try_parse_from(["vapmod", "path", "set"]).is_err());
        assert!(Cli::try_parse_from(["vapmod", "path", "show"]).is_ok());
    }
}
