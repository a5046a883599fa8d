//! `placesync import`: reconcile every configured language.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use placesync_sync::pipeline::{self, SyncScope};

use super::{build_engine, load_config, print_plan, print_report};

/// Arguments for `placesync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Show what would change without writing any records.
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    pub fn run(self, store: Option<PathBuf>) -> Result<()> {
        let (config, mut engine) = match load_config(store)
            .and_then(|config| build_engine(&config).map(|engine| (config, engine)))
        {
            Ok(pair) => pair,
            Err(err) => {
                tracing::error!("import not started: {err:#}");
                return Ok(());
            }
        };

        if self.dry_run {
            for (to, plan) in pipeline::plan(&engine, &config, &SyncScope::All) {
                print_plan(&to, &plan);
            }
            return Ok(());
        }

        let reports = pipeline::import_all(&mut engine, &config);
        for report in &reports {
            print_report(report);
        }
        Ok(())
    }
}
