//! Schema-mapping persistence
//!
//! Versioned schema entries and SRN-to-record mappings behind a narrow
//! key-lookup contract. Entries are immutable once created; the store is
//! append-only, so writers need no coordination. "Store unreachable" is a
//! distinct failure from "no mapping exists".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::StaticMappingStore;
pub use sqlite::SqliteMappingStore;

/// One immutable schema mapping: a versioned type id, the record kind it
/// maps to, and the schema document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Full versioned type id, e.g. `srn:type:work-product/WellLog:1`
    pub srn: String,
    /// The `<type>` segment shared by all versions of this type
    pub type_tag: String,
    /// Record kind this type maps to, e.g. `tenant:wks:WellLog:1.0.0`
    pub kind: String,
    /// Schema document; genuinely open-ended, kept opaque
    pub schema: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// SRN to stored-record mapping created after successful ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrnRecord {
    pub srn: String,
    pub record_id: String,
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing store could not be reached or answered abnormally;
    /// distinct from "no mapping exists" (`Ok(None)`).
    #[error("Mapping store unavailable: {0}")]
    Unavailable(String),

    /// Append-only violation: an entry with this key already exists
    #[error("Entry already exists: {0}")]
    Duplicate(String),

    /// A persisted document could not be decoded
    #[error("Corrupt entry for {0}: {1}")]
    Corrupt(String, String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.to_string());
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// Key-lookup contract over the persisted mapping collection.
///
/// The exact-vs-latest policy lives in `MappingService`; implementations only
/// execute the chosen query.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Entry whose full versioned id matches exactly, if any
    async fn find_exact(&self, type_id: &str) -> Result<Option<SchemaEntry>, StoreError>;

    /// Entry with the maximum created-at among all versions of `type_tag`,
    /// if any exist
    async fn find_latest(&self, type_tag: &str) -> Result<Option<SchemaEntry>, StoreError>;

    /// Append a new entry; never mutates or deletes existing ones
    async fn save(&self, entry: &SchemaEntry) -> Result<(), StoreError>;

    /// Record mapping for a data SRN, if one was created
    async fn find_record(&self, srn: &str) -> Result<Option<SrnRecord>, StoreError>;

    /// Append a new SRN-to-record mapping
    async fn save_record(&self, record: &SrnRecord) -> Result<(), StoreError>;
}
