//! SQLite-backed mapping store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::{MappingStore, SchemaEntry, SrnRecord, StoreError};

/// Mapping store over a SQLite collection.
///
/// Timestamps are persisted as RFC 3339 UTC text, which sorts
/// lexicographically in timestamp order.
pub struct SqliteMappingStore {
    pool: SqlitePool,
}

impl SqliteMappingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the mapping tables if they do not exist yet
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_mappings (
                srn TEXT PRIMARY KEY,
                type_tag TEXT NOT NULL,
                kind TEXT NOT NULL,
                schema TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_schema_mappings_type
             ON schema_mappings(type_tag, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS srn_records (
                srn TEXT PRIMARY KEY,
                record_id TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SchemaEntry, StoreError> {
        let srn: String = row.try_get("srn")?;
        let schema_text: String = row.try_get("schema")?;
        let created_at_text: String = row.try_get("created_at")?;

        let schema = serde_json::from_str(&schema_text)
            .map_err(|e| StoreError::Corrupt(srn.clone(), e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_text)
            .map_err(|e| StoreError::Corrupt(srn.clone(), e.to_string()))?
            .with_timezone(&Utc);

        Ok(SchemaEntry {
            srn,
            type_tag: row.try_get("type_tag")?,
            kind: row.try_get("kind")?,
            schema,
            created_at,
        })
    }
}

#[async_trait]
impl MappingStore for SqliteMappingStore {
    async fn find_exact(&self, type_id: &str) -> Result<Option<SchemaEntry>, StoreError> {
        tracing::debug!(type_id = %type_id, "Exact schema lookup");
        let row = sqlx::query(
            "SELECT srn, type_tag, kind, schema, created_at
             FROM schema_mappings WHERE srn = ?",
        )
        .bind(type_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn find_latest(&self, type_tag: &str) -> Result<Option<SchemaEntry>, StoreError> {
        tracing::debug!(type_tag = %type_tag, "Latest schema lookup");
        let row = sqlx::query(
            "SELECT srn, type_tag, kind, schema, created_at
             FROM schema_mappings WHERE type_tag = ?
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(type_tag)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn save(&self, entry: &SchemaEntry) -> Result<(), StoreError> {
        let schema_text = serde_json::to_string(&entry.schema)
            .map_err(|e| StoreError::Corrupt(entry.srn.clone(), e.to_string()))?;

        // Plain INSERT: duplicates fail instead of updating in place.
        sqlx::query(
            "INSERT INTO schema_mappings (srn, type_tag, kind, schema, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.srn)
        .bind(&entry.type_tag)
        .bind(&entry.kind)
        .bind(&schema_text)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(srn = %entry.srn, "Schema entry saved");
        Ok(())
    }

    async fn find_record(&self, srn: &str) -> Result<Option<SrnRecord>, StoreError> {
        let row = sqlx::query("SELECT srn, record_id FROM srn_records WHERE srn = ?")
            .bind(srn)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|row| -> Result<SrnRecord, StoreError> {
                Ok(SrnRecord {
                    srn: row.try_get("srn")?,
                    record_id: row.try_get("record_id")?,
                })
            })
            .transpose()?)
    }

    async fn save_record(&self, record: &SrnRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO srn_records (srn, record_id) VALUES (?, ?)")
            .bind(&record.srn)
            .bind(&record.record_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(srn = %record.srn, record_id = %record.record_id, "SRN record saved");
        Ok(())
    }
}
