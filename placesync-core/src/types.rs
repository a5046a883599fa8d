//! Domain types shared by the store, the sync engine and the CLI.
//!
//! Metadata is the one place where a string-keyed map survives: the local
//! store reads and writes fields by name, so [`LocalRecord::meta`] is a
//! `BTreeMap<String, MetaValue>` with a closed set of value shapes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Metadata field holding the external join key on every synced record.
pub const ENTITY_API_ID: &str = "tamperefi_api_id";

// ---------------------------------------------------------------------------
// Metadata field names
// ---------------------------------------------------------------------------

pub mod fields {
    pub const TITLE: &str = "title";
    pub const SUMMARY: &str = "summary";
    pub const DESCRIPTION: &str = "description";
    pub const ADDITIONAL_INFORMATION: &str = "additional_information";
    pub const MAIL_ADDRESS_STREET: &str = "mail_address_street";
    pub const MAIL_ADDRESS_ZIP_CODE: &str = "mail_address_zip_code";
    pub const MAIL_ADDRESS_CITY: &str = "mail_address_city";
    pub const PHONE_REPEATER: &str = "phone_repeater";
}

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A language tag such as `fi` or `en`.
///
/// Restricted to ASCII letters, digits, `-` and `_` since it is spliced into
/// the remote endpoint path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("language code must not be empty".to_string());
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!(
                "invalid language code '{trimmed}'; expected letters, digits, '-' or '_'"
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl From<&str> for LanguageCode {
    /// Infallible constructor for literals; input is lower-cased but not validated.
    fn from(s: &str) -> Self {
        Self(s.to_ascii_lowercase())
    }
}

/// Cross-system join key: `"{external_id}-{language_code}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalKey(String);

impl ExternalKey {
    pub fn new(external_id: i64, language: &str) -> Self {
        Self(format!("{external_id}-{language}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ExternalKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExternalKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque local record identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Metadata values
// ---------------------------------------------------------------------------

/// One row of the `phone_repeater` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEntry {
    pub phone_number: String,
    pub phone_text: String,
}

/// A metadata field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Phones(Vec<PhoneEntry>),
}

impl MetaValue {
    /// Empty string or empty sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            MetaValue::Text(s) => s.is_empty(),
            MetaValue::Phones(p) => p.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::Phones(_) => None,
        }
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_owned())
    }
}

impl From<Vec<PhoneEntry>> for MetaValue {
    fn from(p: Vec<PhoneEntry>) -> Self {
        MetaValue::Phones(p)
    }
}

// ---------------------------------------------------------------------------
// Local record
// ---------------------------------------------------------------------------

/// A place-of-business record owned by the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    pub id: RecordId,
    pub title: String,
    pub language: LanguageCode,
    #[serde(default)]
    pub meta: BTreeMap<String, MetaValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalRecord {
    pub fn new(id: RecordId, title: &str, language: LanguageCode) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.to_owned(),
            language,
            meta: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The stored join key, if this record is tracked by the sync.
    pub fn external_key(&self) -> Option<ExternalKey> {
        self.meta
            .get(ENTITY_API_ID)
            .and_then(MetaValue::as_text)
            .filter(|s| !s.is_empty())
            .map(ExternalKey::from)
    }

    /// Set the title. Returns `true` if the stored value changed.
    pub fn set_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_owned();
        self.updated_at = Utc::now();
        true
    }

    /// Write one metadata field. Returns `true` if the stored value changed.
    ///
    /// An existing join key can never be blanked.
    pub fn set_meta(&mut self, key: &str, value: MetaValue) -> Result<bool, StoreError> {
        if key == ENTITY_API_ID && value.is_empty() && self.external_key().is_some() {
            return Err(StoreError::ProtectedField {
                id: self.id,
                key: key.to_owned(),
            });
        }
        if self.meta.get(key) == Some(&value) {
            return Ok(false);
        }
        self.meta.insert(key.to_owned(), value);
        self.updated_at = Utc::now();
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
