//! List the recursive dependencies of one or more assets.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::OutputFormat;
use crate::config::Settings;
use crate::core::LocalizeError;
use crate::dependencies::{DependencyReport, compute_dependencies_of};
use crate::graph::DependencyGraph;
use crate::localize::ReferenceTypesToInclude;
use crate::resolver::Resolver;
use crate::sdf::LayerRegistry;

/// Command to list every layer and asset the given assets depend on.
#[derive(Args, Debug)]
pub struct DepsCommand {
    /// Root assets; several roots share one session
    #[arg(required = true, num_args = 1..)]
    pub assets: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also show the dependency tree of each root and a dependencies-first order
    #[arg(long)]
    pub graph: bool,

    /// Only follow sublayers, references, payloads and value clips
    #[arg(long)]
    pub composition_only: bool,

    /// Only report the direct dependencies of the roots
    #[arg(long)]
    pub no_recurse: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a DependencyReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<Vec<String>>,
}

impl DepsCommand {
    /// Runs the command.
    pub async fn execute(self, mut settings: Settings) -> Result<()> {
        if self.composition_only {
            settings.localize.reference_types = ReferenceTypesToInclude::CompositionOnly;
        }
        if self.no_recurse {
            settings.localize.recurse = false;
        }

        let resolver = settings.resolver()?;
        let mut paths = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let path = resolver.resolve(&resolver.create_identifier(asset, None)).ok_or_else(|| {
                LocalizeError::RootUnreadable {
                    path: asset.clone(),
                    reason: "the path does not resolve to a file".to_string(),
                }
            })?;
            paths.push(path);
        }

        let registry = LayerRegistry::new();
        let opened = registry.open_all(&paths, settings.localize.max_parallel).await;
        let mut roots = Vec::with_capacity(opened.len());
        for (handle, asset) in opened.into_iter().zip(&self.assets) {
            roots.push(handle.ok_or_else(|| LocalizeError::RootUnreadable {
                path: asset.clone(),
                reason: "the file is not a readable layer".to_string(),
            })?);
        }

        let root_keys: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let report = tokio::task::spawn_blocking(move || {
            compute_dependencies_of(&roots, &registry, &resolver, &settings)
        })
        .await
        .map_err(|e| anyhow!("Task join error computing dependencies: {e}"))??;

        let graph = self.graph.then(|| DependencyGraph::from_report(&report));
        match self.format {
            OutputFormat::Json => {
                let output = JsonOutput {
                    report: &report,
                    order: graph.as_ref().map(DependencyGraph::topological_order),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => print_text(&report, graph.as_ref(), &root_keys),
        }
        Ok(())
    }
}

fn print_text(report: &DependencyReport, graph: Option<&DependencyGraph>, roots: &[String]) {
    println!("{}", "Layers:".cyan().bold());
    for layer in &report.layers {
        println!("  {layer}");
    }

    if !report.assets.is_empty() {
        println!("{}", "Assets:".cyan().bold());
        for asset in &report.assets {
            println!("  {asset}");
        }
    }

    if !report.unresolved.is_empty() {
        println!("{}", "Unresolved:".yellow().bold());
        for path in &report.unresolved {
            println!("  {}", path.yellow());
        }
    }

    let Some(graph) = graph else {
        return;
    };
    println!();
    for root in roots {
        print!("{}", graph.to_tree_string(root));
    }
    if graph.has_cycles() {
        println!("{}", "Cyclic dependencies found; order below is discovery order.".yellow());
    }
    println!("{}", "Order (dependencies first):".cyan().bold());
    for (i, node) in graph.topological_order().iter().enumerate() {
        println!("  {:>3}. {node}", i + 1);
    }
}
