//! `placesync sync`: reconcile one language pair.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use placesync_core::LanguageCode;
use placesync_sync::pipeline::{self, SyncScope};

use super::{build_engine, load_config, print_plan, print_report};

/// Arguments for `placesync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote language to import from.
    #[arg(long, default_value = "fi", value_name = "LANG")]
    pub from: LanguageCode,

    /// Local language to import to.
    #[arg(long, default_value = "fi", value_name = "LANG")]
    pub to: LanguageCode,

    /// Show what would change without writing any records.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    /// Always succeeds: failures are logged, never surfaced as an exit code.
    pub fn run(self, store: Option<PathBuf>) -> Result<()> {
        let config = match load_config(store) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("sync not started: {err:#}");
                return Ok(());
            }
        };
        let mut engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!("sync not started: {err:#}");
                return Ok(());
            }
        };

        let scope = SyncScope::Pair {
            from: self.from,
            to: self.to,
        };
        if self.dry_run {
            for (to, plan) in pipeline::plan(&engine, &config, &scope) {
                print_plan(&to, &plan);
            }
            return Ok(());
        }

        for report in pipeline::run(&mut engine, &config, &scope) {
            print_report(&report);
        }
        Ok(())
    }
}
