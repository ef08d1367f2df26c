//! Copy an asset and its dependencies into a self-contained directory.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Settings;
use crate::dependencies::{LocalizeOptions, localize_asset};

/// Command to localize an asset into a directory.
#[derive(Args, Debug)]
pub struct LocalizeCommand {
    /// The root asset
    pub asset: String,

    /// Output directory, created when missing
    pub dest_dir: PathBuf,

    /// File name of the root layer in the output
    #[arg(long)]
    pub first_layer_name: Option<String>,

    /// Rewrite the loaded layers directly instead of working copies
    #[arg(long)]
    pub edit_in_place: bool,
}

impl LocalizeCommand {
    /// Runs the command.
    pub async fn execute(self, mut settings: Settings) -> Result<()> {
        if self.edit_in_place {
            settings.localize.edit_layers_in_place = true;
        }
        let options = LocalizeOptions {
            first_layer_name: self.first_layer_name,
            settings,
        };

        let asset = self.asset;
        let dest_dir = self.dest_dir;
        let localized = {
            let dest_dir = dest_dir.clone();
            tokio::task::spawn_blocking(move || localize_asset(&asset, &dest_dir, &options))
                .await
                .map_err(|e| anyhow!("Task join error localizing asset: {e}"))??
        };

        println!(
            "{} {} layers and {} files into {}",
            "Localized".green().bold(),
            localized.layers.len(),
            localized.files.len(),
            dest_dir.display()
        );
        println!("  root: {}", localized.root.display());
        for path in &localized.unresolved {
            println!("  {} {}", "unresolved:".yellow(), path);
        }
        Ok(())
    }
}
