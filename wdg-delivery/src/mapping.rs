//! SRN mapping resolution
//!
//! Decides exact-version vs latest-version lookup from the parsed type id;
//! the store underneath only executes the chosen query.

use std::sync::Arc;
use wdg_common::srn::ResourceTypeId;

use crate::store::{MappingStore, SchemaEntry, SrnRecord, StoreError};

pub struct MappingService {
    store: Arc<dyn MappingStore>,
}

impl MappingService {
    pub fn new(store: Arc<dyn MappingStore>) -> Self {
        Self { store }
    }

    /// Schema entry for a parsed type id.
    ///
    /// An exact-version request returns the unique matching entry; a
    /// version-less request returns the entry with the maximum created-at
    /// among all versions of the type. `Ok(None)` means no mapping exists,
    /// which is a classification, not an error.
    pub async fn schema_for(
        &self,
        type_id: &ResourceTypeId,
    ) -> Result<Option<SchemaEntry>, StoreError> {
        let entry = if type_id.has_version() {
            self.store.find_exact(type_id.raw()).await?
        } else {
            self.store.find_latest(type_id.type_tag()).await?
        };
        tracing::debug!(
            type_id = %type_id,
            found = entry.is_some(),
            exact = type_id.has_version(),
            "Schema mapping lookup"
        );
        Ok(entry)
    }

    /// Append a new schema entry
    pub async fn save_schema(&self, entry: &SchemaEntry) -> Result<(), StoreError> {
        self.store.save(entry).await
    }

    /// Record mapping for a data SRN
    pub async fn record_for(&self, srn: &str) -> Result<Option<SrnRecord>, StoreError> {
        self.store.find_record(srn).await
    }

    /// Append a new SRN-to-record mapping
    pub async fn save_record(&self, record: &SrnRecord) -> Result<(), StoreError> {
        self.store.save_record(record).await
    }
}
