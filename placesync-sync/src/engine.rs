//! Reconciliation engine.
//!
//! ## `run(from, to)`: plan then apply
//!
//! 1. Fetch the remote set for `from`; any failure or an empty set aborts
//!    before anything is written.
//! 2. Query local records tagged `from` and index them by join key.
//!    Records without a join key are left alone.
//! 3. Partition: unknown keys are created, known keys are updated. Every
//!    visited key is marked seen, including entities later skipped for a
//!    blank title. Of several entities sharing a key, the first titled one
//!    is kept.
//! 4. Create, tagged `to`. Blank titles are skipped.
//! 5. Update title and metadata of matched records.
//! 6. Delete indexed records whose key was not seen, unless the index was
//!    empty.
//!
//! Each record operation stands alone: a failure is logged and collected
//! in the [`SyncReport`], and the batch moves on.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use placesync_core::{
    ExternalKey, LanguageCode, RecordId, RecordStore, StoreError, ENTITY_API_ID,
};

use crate::error::SyncError;
use crate::normalize::{normalize, CanonicalEntity};
use crate::remote::RemoteSource;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A matched pair: normalized remote entity and the local record it updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub entity: CanonicalEntity,
    pub id: RecordId,
}

/// A local record with no remote counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelete {
    pub key: ExternalKey,
    pub id: RecordId,
}

/// What a run would do, computed without writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub from: LanguageCode,
    pub creates: Vec<CanonicalEntity>,
    pub updates: Vec<PlannedUpdate>,
    pub deletes: Vec<PlannedDelete>,
    /// Number of local records carrying a join key at plan time.
    pub indexed: usize,
}

impl SyncPlan {
    /// Keys of entities that will be skipped for a blank title.
    pub fn skipped(&self) -> Vec<&ExternalKey> {
        self.creates
            .iter()
            .chain(self.updates.iter().map(|u| &u.entity))
            .filter(|e| !e.has_title())
            .map(|e| &e.external_key)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Nothing was written.
    Aborted { reason: String },
}

/// The record operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedOp {
    Create,
    Update,
    Delete,
}

impl fmt::Display for FailedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedOp::Create => write!(f, "create"),
            FailedOp::Update => write!(f, "update"),
            FailedOp::Delete => write!(f, "delete"),
        }
    }
}

/// One record that could not be written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub key: ExternalKey,
    pub op: FailedOp,
    pub message: String,
}

/// Outcome of one `run(from, to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub from: LanguageCode,
    pub to: LanguageCode,
    pub outcome: RunOutcome,
    pub created: usize,
    /// Matched records where at least one value changed.
    pub updated: usize,
    /// Matched records rewritten with identical values.
    pub unchanged: usize,
    pub deleted: usize,
    /// Entities not written because their title is blank.
    pub skipped: Vec<ExternalKey>,
    pub failures: Vec<RecordFailure>,
}

impl SyncReport {
    fn new(from: &LanguageCode, to: &LanguageCode) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            outcome: RunOutcome::Completed,
            created: 0,
            updated: 0,
            unchanged: 0,
            deleted: 0,
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn aborted(from: &LanguageCode, to: &LanguageCode, reason: String) -> Self {
        Self {
            outcome: RunOutcome::Aborted { reason },
            ..Self::new(from, to)
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted { .. })
    }

    fn fail(&mut self, key: &ExternalKey, op: FailedOp, err: &StoreError) {
        tracing::error!("{} failed for {}: {}", op, key, err);
        self.failures.push(RecordFailure {
            key: key.clone(),
            op,
            message: err.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Where a remote key landed in the plan.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Create(usize),
    Update(usize),
}

/// Reconciles a local store against a remote source.
#[derive(Debug)]
pub struct SyncEngine<R, S> {
    source: R,
    store: S,
}

impl<R: RemoteSource, S: RecordStore> SyncEngine<R, S> {
    pub fn new(source: R, store: S) -> Self {
        Self { source, store }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch, index and partition without writing anything.
    pub fn plan(&self, from: &LanguageCode) -> Result<SyncPlan, SyncError> {
        let remote = self.source.fetch(from)?;
        let index = self.local_index(from)?;

        let mut seen: HashMap<ExternalKey, Slot> = HashMap::new();
        let mut creates: Vec<CanonicalEntity> = Vec::new();
        let mut updates: Vec<PlannedUpdate> = Vec::new();

        for raw in &remote {
            let entity = normalize(raw);
            if let Some(&slot) = seen.get(&entity.external_key) {
                let planned = match slot {
                    Slot::Create(i) => &mut creates[i],
                    Slot::Update(i) => &mut updates[i].entity,
                };
                if !planned.has_title() && entity.has_title() {
                    tracing::warn!(
                        "duplicate remote entity {} replaces an untitled one",
                        entity.external_key
                    );
                    *planned = entity;
                } else {
                    tracing::warn!("duplicate remote entity {} ignored", entity.external_key);
                }
                continue;
            }
            let key = entity.external_key.clone();
            let slot = match index.get(&key) {
                None => {
                    creates.push(entity);
                    Slot::Create(creates.len() - 1)
                }
                Some(&id) => {
                    updates.push(PlannedUpdate { entity, id });
                    Slot::Update(updates.len() - 1)
                }
            };
            seen.insert(key, slot);
        }

        let deletes = if index.is_empty() {
            Vec::new()
        } else {
            index
                .iter()
                .filter(|(key, _)| !seen.contains_key(*key))
                .map(|(key, &id)| PlannedDelete {
                    key: key.clone(),
                    id,
                })
                .collect()
        };

        Ok(SyncPlan {
            from: from.clone(),
            creates,
            updates,
            deletes,
            indexed: index.len(),
        })
    }

    /// Apply a plan: creates, then updates, then deletes.
    pub fn apply(&mut self, plan: SyncPlan, to: &LanguageCode) -> SyncReport {
        let mut report = SyncReport::new(&plan.from, to);

        if !plan.creates.is_empty() {
            tracing::info!(
                "creating {} entities for lang {}",
                plan.creates.len(),
                to
            );
        }
        for entity in &plan.creates {
            if !entity.has_title() {
                tracing::warn!("skipping {}: no title", entity.external_key);
                report.skipped.push(entity.external_key.clone());
                continue;
            }
            match self.create_record(entity, to) {
                Ok(id) => {
                    tracing::debug!("created record {} for {}", id, entity.external_key);
                    report.created += 1;
                }
                Err(err) => report.fail(&entity.external_key, FailedOp::Create, &err),
            }
        }

        if !plan.updates.is_empty() {
            tracing::info!("updating {} entities", plan.updates.len());
        }
        for PlannedUpdate { entity, id } in &plan.updates {
            if !entity.has_title() {
                tracing::warn!("skipping {}: no title", entity.external_key);
                report.skipped.push(entity.external_key.clone());
                continue;
            }
            match self.update_record(*id, entity) {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(err) => report.fail(&entity.external_key, FailedOp::Update, &err),
            }
        }

        if !plan.deletes.is_empty() {
            tracing::info!("deleting {} entities", plan.deletes.len());
        }
        for PlannedDelete { key, id } in &plan.deletes {
            match self.store.delete(*id).and_then(|()| self.store.flush()) {
                Ok(()) => {
                    tracing::debug!("deleted record {} ({})", id, key);
                    report.deleted += 1;
                }
                Err(err) => report.fail(key, FailedOp::Delete, &err),
            }
        }

        report
    }

    /// One reconciliation of `from` remote entities into `to` local records.
    ///
    /// Never fails: an unusable remote or local set yields an aborted report,
    /// per-record failures are collected in the report.
    pub fn run(&mut self, from: &LanguageCode, to: &LanguageCode) -> SyncReport {
        tracing::info!("syncing from {} to {}", from, to);
        let plan = match self.plan(from) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!("nothing to sync from {}, aborting: {}", from, err);
                return SyncReport::aborted(from, to, err.to_string());
            }
        };
        let report = self.apply(plan, to);
        tracing::info!(
            "sync {} -> {} done: {} created, {} updated, {} unchanged, {} deleted, {} skipped, {} failed",
            report.from,
            report.to,
            report.created,
            report.updated,
            report.unchanged,
            report.deleted,
            report.skipped.len(),
            report.failures.len()
        );
        report
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Join key → local id for every tracked record tagged `language`.
    fn local_index(
        &self,
        language: &LanguageCode,
    ) -> Result<BTreeMap<ExternalKey, RecordId>, StoreError> {
        let records = self.store.query(language)?;
        let mut index = BTreeMap::new();
        for record in records {
            if let Some(key) = record.external_key() {
                index.insert(key, record.id);
            }
        }
        Ok(index)
    }

    /// Create a record and write its metadata. A half-written record is
    /// removed again so it cannot linger untracked.
    fn create_record(
        &mut self,
        entity: &CanonicalEntity,
        to: &LanguageCode,
    ) -> Result<RecordId, StoreError> {
        let id = self.store.create(&entity.title, to)?;
        if let Err(err) = self
            .write_metadata(id, entity)
            .and_then(|_| self.store.flush())
        {
            if let Err(cleanup) = self.store.delete(id).and_then(|()| self.store.flush()) {
                tracing::warn!("could not remove half-created record {}: {}", id, cleanup);
            }
            return Err(err);
        }
        Ok(id)
    }

    /// Returns `true` if the title or any field changed.
    fn update_record(&mut self, id: RecordId, entity: &CanonicalEntity) -> Result<bool, StoreError> {
        let title_changed = self.store.update_title(id, &entity.title)?;
        let meta_changed = self.write_metadata(id, entity)?;
        self.store.flush()?;
        Ok(title_changed || meta_changed)
    }

    /// Join key first, then every other field. Fields absent from the
    /// entity are left as they are.
    fn write_metadata(&mut self, id: RecordId, entity: &CanonicalEntity) -> Result<bool, StoreError> {
        let mut changed = false;
        if let Some(key) = entity.metadata.get(ENTITY_API_ID) {
            changed |= self.store.set_meta(id, ENTITY_API_ID, key.clone())?;
        }
        for (name, value) in &entity.metadata {
            if name == ENTITY_API_ID {
                continue;
            }
            changed |= self.store.set_meta(id, name, value.clone())?;
        }
        Ok(changed)
    }
}
