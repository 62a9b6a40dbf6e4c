//! In-memory mapping store
//!
//! Alternate implementation of the same store contract, selected by
//! configuration. Useful before a real collection is provisioned and as a
//! deterministic fixture in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{MappingStore, SchemaEntry, SrnRecord, StoreError};

#[derive(Default)]
pub struct StaticMappingStore {
    entries: Mutex<HashMap<String, SchemaEntry>>,
    records: Mutex<HashMap<String, SrnRecord>>,
}

impl StaticMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry, bypassing the append-only check (fixture setup)
    pub fn with_entry(self, entry: SchemaEntry) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.srn.clone(), entry);
        self
    }

    pub fn with_record(self, record: SrnRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.srn.clone(), record);
        self
    }
}

#[async_trait]
impl MappingStore for StaticMappingStore {
    async fn find_exact(&self, type_id: &str) -> Result<Option<SchemaEntry>, StoreError> {
        Ok(self.entries.lock().unwrap().get(type_id).cloned())
    }

    async fn find_latest(&self, type_tag: &str) -> Result<Option<SchemaEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.type_tag == type_tag)
            .max_by_key(|entry| entry.created_at)
            .cloned())
    }

    async fn save(&self, entry: &SchemaEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&entry.srn) {
            return Err(StoreError::Duplicate(entry.srn.clone()));
        }
        entries.insert(entry.srn.clone(), entry.clone());
        Ok(())
    }

    async fn find_record(&self, srn: &str) -> Result<Option<SrnRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(srn).cloned())
    }

    async fn save_record(&self, record: &SrnRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.srn) {
            return Err(StoreError::Duplicate(record.srn.clone()));
        }
        records.insert(record.srn.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn entry(srn: &str, year: i32) -> SchemaEntry {
        SchemaEntry {
            srn: srn.to_string(),
            type_tag: "work-product/Document".to_string(),
            kind: "tenant:wks:Document:1.0.0".to_string(),
            schema: json!({}),
            created_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn latest_scans_all_versions() {
        let store = StaticMappingStore::new()
            .with_entry(entry("srn:type:work-product/Document:1", 2019))
            .with_entry(entry("srn:type:work-product/Document:2", 2021));

        let latest = store
            .find_latest("work-product/Document")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.srn, "srn:type:work-product/Document:2");
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected() {
        let store = StaticMappingStore::new();
        store.save(&entry("srn:type:work-product/Document:1", 2020)).await.unwrap();
        let err = store
            .save(&entry("srn:type:work-product/Document:1", 2022))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }
}
