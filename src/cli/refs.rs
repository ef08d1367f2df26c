//! List the dependencies authored in a single layer.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::OutputFormat;
use crate::dependencies::extract_external_references;
use crate::localize::ReferenceTypesToInclude;

/// Command to list the sublayers, references and payloads of one layer.
#[derive(Args, Debug)]
pub struct RefsCommand {
    /// The layer to inspect
    pub layer: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Leave out asset-valued properties and metadata
    #[arg(long)]
    pub composition_only: bool,
}

impl RefsCommand {
    /// Runs the command.
    pub async fn execute(self) -> Result<()> {
        let types = if self.composition_only {
            ReferenceTypesToInclude::CompositionOnly
        } else {
            ReferenceTypesToInclude::All
        };
        let refs = extract_external_references(&self.layer, types)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&refs)?),
            OutputFormat::Text => {
                if refs.is_empty() {
                    println!("No external dependencies.");
                    return Ok(());
                }
                for (title, paths) in [
                    ("Sublayers:", &refs.sublayers),
                    ("References:", &refs.references),
                    ("Payloads:", &refs.payloads),
                ] {
                    if paths.is_empty() {
                        continue;
                    }
                    println!("{}", title.cyan().bold());
                    for path in paths {
                        println!("  {path}");
                    }
                }
            }
        }
        Ok(())
    }
}
