//! ARCHCAP CLI - Capability hierarchy and realization inheritance
//!
//! Every invocation builds an in-memory catalog from the configured seed,
//! runs one operation and prints the outcome.
//!
//! Usage:
//!   archcap tree                              - Print the capability tree
//!   archcap reparent <id> [--parent <id>]     - Move a capability
//!   archcap recompute <id>...                 - Repair the listed capabilities
//!   archcap recompute-all                     - Repair every capability
//!   archcap link <capability> <component> <name> [--level Full]
//!   archcap check                             - Verify the tree invariants

mod bootstrap;
mod render;

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use archcap_domain::{CapabilityId, ComponentId, RealizationLevel};
use archcap_usecase::command::{ChangeCapabilityParent, LinkSystemToCapability};
use archcap_usecase::{BatchRecomputeReport, Command, CommandResult};
use clap::{Parser, Subcommand};
use shared::CatalogConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archcap")]
#[command(about = "ARCHCAP - Capability hierarchy with realization inheritance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog configuration (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed document, overrides the configured one
    #[arg(short, long, global = true)]
    seed: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the capability tree
    Tree,
    /// Move a capability under a new parent (none promotes it to L1)
    Reparent {
        capability_id: String,
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Reconcile the inherited copies of the listed capabilities
    Recompute {
        #[arg(required = true)]
        capability_ids: Vec<String>,
    },
    /// Reconcile every capability
    RecomputeAll,
    /// Link a system to a capability
    Link {
        capability_id: String,
        component_id: String,
        component_name: String,
        /// Full, Partial or Planned
        #[arg(short, long, default_value = "Full")]
        level: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Verify the tree invariants
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_file(path)?,
        None => CatalogConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed.clone();
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let catalog = bootstrap::open_catalog(&config)?;

    match cli.command {
        Commands::Tree => print!("{}", render::render_tree(&catalog)?),
        Commands::Reparent {
            capability_id,
            parent,
        } => {
            let result = catalog.dispatch(Command::ChangeCapabilityParent(ChangeCapabilityParent {
                capability_id: CapabilityId::new(capability_id),
                new_parent_id: parent.map(CapabilityId::new),
            }))?;
            print_result(&result, cli.json)?;
            if !cli.json {
                print!("{}", render::render_tree(&catalog)?);
            }
        }
        Commands::Recompute { capability_ids } => {
            let report = catalog.recompute_many(capability_ids.into_iter().map(CapabilityId::new))?;
            print_report(&report, cli.json)?;
        }
        Commands::RecomputeAll => {
            let report = catalog.recompute_all()?;
            print_report(&report, cli.json)?;
        }
        Commands::Link {
            capability_id,
            component_id,
            component_name,
            level,
            notes,
        } => {
            let level = RealizationLevel::parse(&level)
                .ok_or_else(|| anyhow!("Unknown realization level '{level}'"))?;
            let result = catalog.dispatch(Command::LinkSystemToCapability(LinkSystemToCapability {
                capability_id: CapabilityId::new(capability_id),
                component_id: ComponentId::new(component_id),
                component_name,
                level,
                notes,
            }))?;
            print_result(&result, cli.json)?;
        }
        Commands::Check => {
            let violations = catalog.check_tree()?;
            if cli.json {
                let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for violation in &violations {
                    println!("{violation}");
                }
            }
            if !violations.is_empty() {
                bail!("{} tree violation(s) found", violations.len());
            }
            if !cli.json {
                println!("Tree is consistent");
            }
        }
    }
    Ok(())
}

fn print_result(result: &CommandResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!(
            "{}: {} event(s) raised",
            result.id.as_deref().unwrap_or("-"),
            result.events_raised
        );
    }
    Ok(())
}

fn print_report(report: &BatchRecomputeReport, json: bool) -> anyhow::Result<()> {
    let failed: Vec<String> = report
        .failed
        .iter()
        .map(|(id, error)| format!("{id}: {error}"))
        .collect();
    if json {
        let value = serde_json::json!({
            "recomputed": report.recomputed.len(),
            "changed": report.changed,
            "failed": failed,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "Recomputed {} capabilities, {} changed",
            report.recomputed.len(),
            report.changed.len()
        );
        for line in &failed {
            println!("  failed {line}");
        }
    }
    Ok(())
}
