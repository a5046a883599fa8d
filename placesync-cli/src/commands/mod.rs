//! Subcommands and the wiring they share.

pub mod import;
pub mod records;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use placesync_core::{ApiConfig, JsonFileStore, LanguageCode, SyncConfig};
use placesync_sync::{HttpSource, RunOutcome, SyncEngine, SyncError, SyncPlan, SyncReport};

pub(crate) type Engine = SyncEngine<HttpSource, JsonFileStore>;

/// Read configuration from the environment, honouring `--store`.
pub(crate) fn load_config(store: Option<PathBuf>) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_env().context("failed to read configuration")?;
    if let Some(path) = store {
        config.store_path = path;
    }
    Ok(config)
}

/// Connect the HTTP source and open the record store.
pub(crate) fn build_engine(config: &SyncConfig) -> Result<Engine> {
    let api = ApiConfig::from_env().context("remote API is not configured")?;
    let store = JsonFileStore::open(&config.store_path).with_context(|| {
        format!(
            "failed to open record store at {}",
            config.store_path.display()
        )
    })?;
    Ok(SyncEngine::new(HttpSource::new(api), store))
}

pub(crate) fn print_report(report: &SyncReport) {
    let pair = format!("{} → {}", report.from, report.to);
    if let RunOutcome::Aborted { reason } = &report.outcome {
        println!("{} {pair} aborted: {reason}", "✗".yellow().bold());
        return;
    }

    let mark = if report.failures.is_empty() {
        "✓".green().bold()
    } else {
        "!".red().bold()
    };
    println!(
        "{mark} {pair}: {} created, {} updated, {} unchanged, {} deleted",
        report.created, report.updated, report.unchanged, report.deleted
    );
    for key in &report.skipped {
        println!("  ·  skipped {key} (no title)");
    }
    for failure in &report.failures {
        println!("  ✗  {} {}: {}", failure.op, failure.key, failure.message);
    }
}

pub(crate) fn print_plan(to: &LanguageCode, plan: &Result<SyncPlan, SyncError>) {
    let plan = match plan {
        Ok(plan) => plan,
        Err(err) => {
            println!("[dry-run] {} would abort: {err}", "✗".yellow().bold());
            return;
        }
    };

    println!(
        "[dry-run] {} → {to}: {} to create, {} to update, {} to delete",
        plan.from,
        plan.creates.len(),
        plan.updates.len(),
        plan.deletes.len()
    );
    for entity in plan.creates.iter().filter(|e| e.has_title()) {
        println!("  +  {} {}", entity.external_key, entity.title);
    }
    for update in plan.updates.iter().filter(|u| u.entity.has_title()) {
        println!("  ~  {} (record {})", update.entity.external_key, update.id);
    }
    for delete in &plan.deletes {
        println!("  -  {} (record {})", delete.key, delete.id);
    }
    for key in plan.skipped() {
        println!("  ·  {key} skipped (no title)");
    }
}
