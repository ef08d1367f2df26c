//! Command-line interface for layerdeps.
//!
//! # Commands
//!
//! - `deps` - Every layer and asset one or more assets depend on
//! - `refs` - The dependencies authored in a single layer
//! - `localize` - Gather an asset and its dependencies into a directory
//! - `package` - Gather an asset and its dependencies into a package archive
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - No logging
//! - `--config` / `-c` - Settings file to use instead of the default lookup
//! - `--search-path` - Extra search directory, may be repeated
//!
//! Logging goes to stderr; `RUST_LOG` overrides the level chosen by the
//! flags.
//!
//! # Examples
//!
//! ```bash
//! layerdeps deps shot.usda --graph
//! layerdeps deps shot.usda anim.usda --format json
//! layerdeps refs shot.usda --composition-only
//! layerdeps localize shot.usda ./out --first-layer-name main.usda
//! layerdeps package shot.usda shot.usdz
//! ```

mod deps;
mod localize;
mod package;
mod refs;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Output format of the reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Main CLI structure for layerdeps.
#[derive(Parser, Debug)]
#[command(
    name = "layerdeps",
    about = "Find, localize and package the dependencies of layered scene descriptions",
    version,
    author,
    long_about = "layerdeps walks a root layer and everything it pulls in (sublayers, references, payloads, \
                  asset-valued fields, UDIM tile sets and value clips), reports what it finds, and can \
                  relocate the whole set into a directory or a package archive."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Additional search directory for search-path style asset paths
    #[arg(long = "search-path", global = true, value_name = "DIR")]
    search_paths: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every layer and asset the given assets depend on
    Deps(deps::DepsCommand),

    /// List the dependencies authored in one layer
    Refs(refs::RefsCommand),

    /// Copy an asset and its dependencies into a directory, rewriting paths
    Localize(localize::LocalizeCommand),

    /// Write an asset and its dependencies into a package archive
    Package(package::PackageCommand),
}

impl Cli {
    /// Runs the selected command.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());

        let mut settings = Settings::load(self.config.as_deref()).await?;
        settings.search_paths.extend(self.search_paths.iter().cloned());

        match self.command {
            Commands::Deps(cmd) => cmd.execute(settings).await,
            Commands::Refs(cmd) => cmd.execute().await,
            Commands::Localize(cmd) => cmd.execute(settings).await,
            Commands::Package(cmd) => cmd.execute(settings).await,
        }
    }

    fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            None
        } else {
            Some("warn")
        }
    }
}

fn init_logging(level: Option<&str>) {
    let Some(level) = level else {
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("layerdeps={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
