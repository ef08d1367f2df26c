//! Write an asset and its dependencies into a package archive.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Settings;
use crate::dependencies::LocalizeOptions;
use crate::package::create_new_package;

/// Command to create a package archive.
#[derive(Args, Debug)]
pub struct PackageCommand {
    /// The root asset
    pub asset: String,

    /// Package file to write
    pub package: PathBuf,

    /// File name of the root layer inside the package
    #[arg(long)]
    pub first_layer_name: Option<String>,
}

impl PackageCommand {
    /// Runs the command.
    pub async fn execute(self, settings: Settings) -> Result<()> {
        let options = LocalizeOptions {
            first_layer_name: self.first_layer_name,
            settings,
        };
        let asset = self.asset;
        let package = self.package;

        let summary = tokio::task::spawn_blocking(move || create_new_package(&asset, &package, &options))
            .await
            .map_err(|e| anyhow!("Task join error creating package: {e}"))??;

        println!(
            "{} {} with {} entries",
            "Created".green().bold(),
            summary.package_path.display(),
            summary.entries.len()
        );
        for skipped in &summary.skipped {
            println!("  {} {}", "skipped:".yellow(), skipped);
        }
        for path in &summary.unresolved {
            println!("  {} {}", "unresolved:".yellow(), path);
        }
        Ok(())
    }
}
