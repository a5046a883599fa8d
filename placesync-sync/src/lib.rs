//! # placesync-sync
//!
//! Remote fetch, normalization and reconciliation.
//!
//! Build a [`SyncEngine`] from a [`RemoteSource`] and a
//! [`placesync_core::RecordStore`], then call [`SyncEngine::run`] for one
//! language pair or [`pipeline::import_all`] for every configured language.

pub mod engine;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod remote;

pub use engine::{
    FailedOp, PlannedDelete, PlannedUpdate, RecordFailure, RunOutcome, SyncEngine, SyncPlan,
    SyncReport,
};
pub use error::{FetchError, SyncError};
pub use normalize::{normalize, CanonicalEntity};
pub use remote::{HttpSource, RemoteEntity, RemoteSource};
