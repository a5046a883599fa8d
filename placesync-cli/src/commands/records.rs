//! `placesync records`: inspect the local store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use placesync_core::{JsonFileStore, LanguageCode, LocalRecord};

use super::load_config;

/// Arguments for `placesync records`.
#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// Only list records tagged with this language.
    #[arg(long, value_name = "LANG")]
    pub lang: Option<LanguageCode>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RecordJson {
    id: u64,
    language: String,
    external_key: Option<String>,
    title: String,
    updated_at: String,
}

#[derive(Tabled)]
struct RecordTableRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "lang")]
    language: String,
    #[tabled(rename = "external key")]
    external_key: String,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "updated")]
    updated: String,
}

impl RecordsArgs {
    pub fn run(self, store: Option<PathBuf>) -> Result<()> {
        let config = load_config(store)?;
        let store = JsonFileStore::open(&config.store_path).with_context(|| {
            format!(
                "failed to open record store at {}",
                config.store_path.display()
            )
        })?;

        let records: Vec<&LocalRecord> = store
            .records()
            .filter(|r| self.lang.as_ref().map_or(true, |lang| &r.language == lang))
            .collect();

        if self.json {
            print_json(&records)
        } else {
            print_table(&records);
            Ok(())
        }
    }
}

fn print_json(records: &[&LocalRecord]) -> Result<()> {
    let payload: Vec<RecordJson> = records
        .iter()
        .map(|r| RecordJson {
            id: r.id.0,
            language: r.language.to_string(),
            external_key: r.external_key().map(|k| k.to_string()),
            title: r.title.clone(),
            updated_at: r.updated_at.to_rfc3339(),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize records JSON")?
    );
    Ok(())
}

fn print_table(records: &[&LocalRecord]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }

    let rows: Vec<RecordTableRow> = records
        .iter()
        .map(|r| RecordTableRow {
            id: r.id.0,
            language: r.language.to_string(),
            external_key: r
                .external_key()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "-".to_string()),
            title: r.title.clone(),
            updated: r.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} records", records.len());
}
