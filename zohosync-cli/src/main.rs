//! zohosync-cli entry point

mod api;
mod config;
mod sync;

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::*;

use api::{AirtableClient, ZohoClient};
use config::Config;
use sync::providers::SourceSchemaProvider;
use sync::{ExplicitNaming, SyncEngine, SyncOptions, SyncReport};

/// Warnings printed in full before the summary truncates
const MAX_PRINTED_WARNINGS: usize = 25;

#[derive(Debug, Parser)]
#[command(
    name = "zohosync-cli",
    version,
    about = "Mirror Zoho CRM modules into Airtable",
    long_about = "Mirrors Zoho CRM modules into an Airtable base: field schema, \
                  records, and record relationships. Modules referenced by the \
                  requested ones are synced first, automatically."
)]
struct Cli {
    /// Modules to sync (dependencies are pulled in automatically)
    modules: Vec<String>,

    /// Sync every API-supported module
    #[arg(long, conflicts_with = "modules")]
    all_modules: bool,

    /// List available modules and exit
    #[arg(long)]
    list_modules: bool,

    /// Delete existing target records before importing
    #[arg(long)]
    clear: bool,

    /// Skip linked-field creation and population
    #[arg(long)]
    skip_links: bool,

    /// Replace relationship-module inference with an explicit mapping
    /// (repeatable; fields without an entry stay unlinked)
    #[arg(long = "map", value_name = "FIELD=MODULE")]
    map: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let zoho = ZohoClient::new(&config.zoho);
    let airtable = AirtableClient::new(&config.airtable);

    if cli.list_modules {
        let modules = zoho.list_modules().await.context("could not list Zoho modules")?;
        println!("{}", "Available modules:".bold());
        for module in &modules {
            match &module.plural_label {
                Some(label) => println!("  {} ({})", module.api_name, label.dimmed()),
                None => println!("  {}", module.api_name),
            }
        }
        return Ok(());
    }

    let modules: Vec<String> = if cli.all_modules {
        zoho.list_modules()
            .await
            .context("could not list Zoho modules")?
            .into_iter()
            .map(|m| m.api_name)
            .collect()
    } else {
        cli.modules.clone()
    };
    if modules.is_empty() {
        bail!("no modules given; pass module names or use --all-modules");
    }

    let options = SyncOptions {
        clear_existing: cli.clear,
        populate_links: !cli.skip_links,
    };
    let mut engine = SyncEngine::new(&zoho, &airtable, options);
    if !cli.map.is_empty() {
        let mut mapping = HashMap::new();
        for entry in &cli.map {
            let Some((field, module)) = entry.split_once('=') else {
                bail!("invalid --map entry '{}', expected FIELD=MODULE", entry);
            };
            mapping.insert(field.to_string(), module.to_string());
        }
        engine = engine.with_naming(Box::new(ExplicitNaming::new(mapping)));
    }

    let mut reports = Vec::new();
    for module in &modules {
        println!("{} {}", "Syncing".bold(), module.bold());
        let report = engine
            .sync(module)
            .await
            .with_context(|| format!("sync of '{}' failed", module))?;
        print_report(&report);
        reports.push(report);
    }

    let total_records: usize = reports.iter().map(SyncReport::total_records).sum();
    let total_fields: usize = reports.iter().map(SyncReport::total_fields_created).sum();
    let total_links: usize = reports.iter().map(SyncReport::total_links_resolved).sum();
    let total_pending: usize = reports.iter().map(SyncReport::total_links_pending).sum();
    println!(
        "\n{} {} records written, {} fields created, {} links resolved across {} module request(s)",
        "Done:".green().bold(),
        total_records,
        total_fields,
        total_links,
        modules.len()
    );
    if total_pending > 0 {
        println!(
            "{} {} link(s) left pending; re-run once the referenced modules have synced",
            "Note:".yellow().bold(),
            total_pending
        );
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    for summary in &report.modules {
        println!(
            "  {} {}: {} created, {} updated, {} fields added, {} links resolved, {} pending",
            "✓".green(),
            summary.module.bold(),
            summary.records_created,
            summary.records_updated,
            summary.fields_created + summary.linked_fields_created,
            summary.links_resolved,
            summary.links_pending,
        );
    }

    if !report.warnings.is_empty() {
        println!("  {} {} warning(s):", "⚠".yellow(), report.warnings.len());
        for warning in report.warnings.iter().take(MAX_PRINTED_WARNINGS) {
            println!("    - {}", warning.to_string().dimmed());
        }
        if report.warnings.len() > MAX_PRINTED_WARNINGS {
            println!(
                "    … and {} more",
                report.warnings.len() - MAX_PRINTED_WARNINGS
            );
        }
    }
}
