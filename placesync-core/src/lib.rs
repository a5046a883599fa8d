//! placesync core library: domain types, record stores, configuration.
//!
//! - [`types`]: newtypes, metadata values, [`LocalRecord`]
//! - [`store`]: the [`RecordStore`] trait and [`MemoryStore`]
//! - [`json_store`]: [`JsonFileStore`], the durable store
//! - [`config`]: environment-backed [`SyncConfig`] and [`ApiConfig`]
//! - [`error`]: [`StoreError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod json_store;
pub mod store;
pub mod types;

pub use config::{ApiConfig, LanguageSettings, SyncConfig};
pub use error::{ConfigError, StoreError};
pub use json_store::JsonFileStore;
pub use store::{MemoryStore, RecordStore};
pub use types::{
    ExternalKey, LanguageCode, LocalRecord, MetaValue, PhoneEntry, RecordId, ENTITY_API_ID,
};
