//! Multi-language sync pipeline built on [`SyncEngine`].

use placesync_core::{LanguageCode, RecordStore, SyncConfig};

use crate::engine::{SyncEngine, SyncPlan, SyncReport};
use crate::error::SyncError;
use crate::remote::RemoteSource;

/// Scope for a sync pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Every configured language, each into its target language.
    All,
    /// A single explicit language pair.
    Pair { from: LanguageCode, to: LanguageCode },
}

/// The `(from, to)` pairs a scope expands to.
///
/// Without a multi-language facility, `All` is a single default → default
/// run. Otherwise the default language imports into itself and every other
/// language into the fallback language.
pub fn language_pairs(config: &SyncConfig, scope: &SyncScope) -> Vec<(LanguageCode, LanguageCode)> {
    match scope {
        SyncScope::Pair { from, to } => vec![(from.clone(), to.clone())],
        SyncScope::All => match &config.languages {
            None => vec![(
                config.default_language.clone(),
                config.default_language.clone(),
            )],
            Some(settings) => settings
                .languages
                .iter()
                .map(|from| (from.clone(), settings.target_for(from)))
                .collect(),
        },
    }
}

/// Run the sync pipeline for a scope, one independent run per language pair.
pub fn run<R, S>(engine: &mut SyncEngine<R, S>, config: &SyncConfig, scope: &SyncScope) -> Vec<SyncReport>
where
    R: RemoteSource,
    S: RecordStore,
{
    language_pairs(config, scope)
        .into_iter()
        .map(|(from, to)| engine.run(&from, &to))
        .collect()
}

/// Run every configured language. An aborted or partially failed language
/// does not stop the ones after it.
pub fn import_all<R, S>(engine: &mut SyncEngine<R, S>, config: &SyncConfig) -> Vec<SyncReport>
where
    R: RemoteSource,
    S: RecordStore,
{
    let reports = run(engine, config, &SyncScope::All);
    let aborted = reports.iter().filter(|r| r.is_aborted()).count();
    if aborted > 0 {
        tracing::warn!("{} of {} language runs aborted", aborted, reports.len());
    }
    reports
}

/// Plan every pair of a scope without writing. The target language of each
/// pair is returned alongside its plan.
pub fn plan<R, S>(
    engine: &SyncEngine<R, S>,
    config: &SyncConfig,
    scope: &SyncScope,
) -> Vec<(LanguageCode, Result<SyncPlan, SyncError>)>
where
    R: RemoteSource,
    S: RecordStore,
{
    language_pairs(config, scope)
        .into_iter()
        .map(|(from, to)| (to, engine.plan(&from)))
        .collect()
}
