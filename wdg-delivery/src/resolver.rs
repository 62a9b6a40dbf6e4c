//! Bulk SRN delivery resolution
//!
//! Each requested SRN independently resolves to exactly one outcome: an
//! inline-data item, a signed-file item, or an entry in the unprocessed list.
//! The result and unprocessed counts always reconcile with the request size.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wdg_common::headers::RequestHeaders;
use wdg_common::srn::ResourceTypeId;

use crate::client::RecordApi;
use crate::mapping::MappingService;

/// Record data field referencing a stored file
const BUCKET_URL_FIELD: &str = "bucketURL";
/// Record data field carrying the inline domain payload
const DATA_FIELD: &str = "osdu";

/// Per-SRN classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    NoMapping,
    Data,
    File,
}

#[derive(Debug, Clone)]
struct ProcessingResult {
    index: usize,
    srn: String,
    kind: OutcomeKind,
    data: Option<serde_json::Value>,
    file_location: Option<String>,
}

/// One successfully resolved SRN
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItem {
    pub srn: String,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_location: Option<String>,
}

/// Batch delivery response: successful outcomes plus the SRNs that could not
/// be processed. `result.len() + unprocessed_srns.len()` equals the request
/// size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub result: Vec<ResponseItem>,
    pub unprocessed_srns: Vec<String>,
}

/// Resolves SRN batches against the mapping store and record backend
pub struct DeliveryResolver {
    mapping: Arc<MappingService>,
    records: Arc<dyn RecordApi>,
    fan_out: usize,
    batch_deadline: Duration,
}

impl DeliveryResolver {
    pub fn new(
        mapping: Arc<MappingService>,
        records: Arc<dyn RecordApi>,
        fan_out: usize,
        batch_deadline: Duration,
    ) -> Self {
        Self {
            mapping,
            records,
            fan_out: fan_out.max(1),
            batch_deadline,
        }
    }

    /// Resolve a batch of SRNs for delivery.
    ///
    /// Per-item failures (malformed SRN, absent mapping, unreachable store or
    /// backend) are absorbed into that item's outcome; SRNs still unfinished
    /// when the batch deadline elapses are reported unprocessed.
    pub async fn resolve(
        &self,
        srns: &[String],
        target_region: Option<&str>,
        headers: &RequestHeaders,
    ) -> DeliveryResponse {
        tracing::debug!(
            srns = srns.len(),
            target_region = target_region.unwrap_or("-"),
            "Delivery request"
        );

        let futures: Vec<_> = srns
            .iter()
            .enumerate()
            .map(|(index, srn)| self.process(index, srn, headers))
            .collect();
        let mut stream = stream::iter(futures).buffer_unordered(self.fan_out);

        let deadline = tokio::time::sleep(self.batch_deadline);
        tokio::pin!(deadline);

        let mut outcomes: Vec<ProcessingResult> = Vec::with_capacity(srns.len());
        loop {
            tokio::select! {
                next = stream.next() => match next {
                    Some(outcome) => outcomes.push(outcome),
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        finished = outcomes.len(),
                        total = srns.len(),
                        "Delivery deadline elapsed, reporting unfinished SRNs as unprocessed"
                    );
                    break;
                }
            }
        }
        drop(stream);

        let mut response = DeliveryResponse::default();
        let finished: HashSet<usize> = outcomes.iter().map(|o| o.index).collect();
        for outcome in outcomes {
            match outcome.kind {
                OutcomeKind::NoMapping => response.unprocessed_srns.push(outcome.srn),
                kind => response.result.push(ResponseItem {
                    srn: outcome.srn,
                    kind,
                    data: outcome.data,
                    file_location: outcome.file_location,
                }),
            }
        }
        for (index, srn) in srns.iter().enumerate() {
            if !finished.contains(&index) {
                response.unprocessed_srns.push(srn.clone());
            }
        }

        tracing::info!(
            resolved = response.result.len(),
            unprocessed = response.unprocessed_srns.len(),
            "Delivery batch resolved"
        );
        response
    }

    async fn process(
        &self,
        index: usize,
        srn: &str,
        headers: &RequestHeaders,
    ) -> ProcessingResult {
        let kind = self.classify(srn, headers).await;
        match kind {
            Ok((kind, data, file_location)) => ProcessingResult {
                index,
                srn: srn.to_string(),
                kind,
                data,
                file_location,
            },
            Err(reason) => {
                tracing::warn!(srn = %srn, reason = %reason, "SRN not processed");
                ProcessingResult {
                    index,
                    srn: srn.to_string(),
                    kind: OutcomeKind::NoMapping,
                    data: None,
                    file_location: None,
                }
            }
        }
    }

    async fn classify(
        &self,
        srn: &str,
        headers: &RequestHeaders,
    ) -> Result<
        (OutcomeKind, Option<serde_json::Value>, Option<String>),
        String,
    > {
        let type_id = ResourceTypeId::parse(srn).map_err(|e| e.to_string())?;

        let schema = self
            .mapping
            .schema_for(&type_id)
            .await
            .map_err(|e| e.to_string())?;
        if schema.is_none() {
            return Err("no schema mapping".to_string());
        }

        let record_mapping = self
            .mapping
            .record_for(srn)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no record mapping".to_string())?;

        let record = self
            .records
            .get_record(&record_mapping.record_id, headers)
            .await
            .map_err(|e| e.to_string())?;

        let payload = record.data.get(DATA_FIELD).cloned();
        match record.data.get(BUCKET_URL_FIELD).and_then(|v| v.as_str()) {
            Some(bucket_url) => {
                let location = self
                    .records
                    .get_file_location(bucket_url, headers)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok((OutcomeKind::File, payload, Some(location.signed_url)))
            }
            None => match payload {
                Some(data) => Ok((OutcomeKind::Data, Some(data), None)),
                None => Err("record carries neither inline data nor a file".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedRecords;
    use crate::client::Record;
    use crate::store::{SchemaEntry, SrnRecord, StaticMappingStore};
    use chrono::Utc;
    use serde_json::json;

    fn headers() -> RequestHeaders {
        RequestHeaders {
            authorization: "Bearer token".to_string(),
            partition: "tenant".to_string(),
            legal_tags: None,
            account_id: None,
            home_region_id: None,
        }
    }

    fn schema_entry(srn: &str, type_tag: &str) -> SchemaEntry {
        SchemaEntry {
            srn: srn.to_string(),
            type_tag: type_tag.to_string(),
            kind: "tenant:wks:WellLog:1.0.0".to_string(),
            schema: json!({}),
            created_at: Utc::now(),
        }
    }

    fn data_record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            kind: None,
            data: json!({"osdu": {"ResourceName": "well 7"}})
                .as_object()
                .unwrap()
                .clone(),
        }
    }

    fn file_record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            kind: None,
            data: json!({"osdu": {"ResourceName": "doc"}, "bucketURL": "/bucket/f.las"})
                .as_object()
                .unwrap()
                .clone(),
        }
    }

    fn resolver(store: StaticMappingStore, records: ScriptedRecords) -> DeliveryResolver {
        DeliveryResolver::new(
            Arc::new(MappingService::new(Arc::new(store))),
            Arc::new(records),
            4,
            Duration::from_secs(5),
        )
    }

    fn srns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn inline_data_classifies_as_data() {
        let srn = "srn:type:work-product/WellLog:1";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(srn, "work-product/WellLog"))
            .with_record(SrnRecord {
                srn: srn.to_string(),
                record_id: "rec-1".to_string(),
            });
        let records = ScriptedRecords::new().with_record(data_record("rec-1"));

        let response = resolver(store, records)
            .resolve(&srns(&[srn]), None, &headers())
            .await;

        assert_eq!(response.result.len(), 1);
        assert!(response.unprocessed_srns.is_empty());
        let item = &response.result[0];
        assert_eq!(item.kind, OutcomeKind::Data);
        assert_eq!(item.data, Some(json!({"ResourceName": "well 7"})));
        assert!(item.file_location.is_none());
    }

    #[tokio::test]
    async fn bucket_url_classifies_as_file_with_signed_location() {
        let srn = "srn:type:work-product/Document:1";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(srn, "work-product/Document"))
            .with_record(SrnRecord {
                srn: srn.to_string(),
                record_id: "rec-2".to_string(),
            });
        let records = ScriptedRecords::new().with_record(file_record("rec-2"));

        let response = resolver(store, records)
            .resolve(&srns(&[srn]), None, &headers())
            .await;

        let item = &response.result[0];
        assert_eq!(item.kind, OutcomeKind::File);
        assert_eq!(
            item.file_location.as_deref(),
            Some("https://signed.example/bucket/f.las")
        );
    }

    #[tokio::test]
    async fn mixed_batch_reconciles_counts() {
        // s1 resolves to data, s2 has no stored mapping.
        let s1 = "srn:type:work-product/WellLog:1";
        let s2 = "srn:type:work-product/Document:1";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(s1, "work-product/WellLog"))
            .with_record(SrnRecord {
                srn: s1.to_string(),
                record_id: "rec-1".to_string(),
            });
        let records = ScriptedRecords::new().with_record(data_record("rec-1"));

        let response = resolver(store, records)
            .resolve(&srns(&[s1, s2]), None, &headers())
            .await;

        assert_eq!(response.result.len() + response.unprocessed_srns.len(), 2);
        assert_eq!(response.result.len(), 1);
        assert_eq!(response.result[0].srn, s1);
        assert_eq!(response.unprocessed_srns, vec![s2.to_string()]);
    }

    #[tokio::test]
    async fn malformed_srn_is_unprocessed_not_fatal() {
        let response = resolver(StaticMappingStore::new(), ScriptedRecords::new())
            .resolve(&srns(&["definitely-not-an-srn"]), None, &headers())
            .await;

        assert!(response.result.is_empty());
        assert_eq!(response.unprocessed_srns, vec!["definitely-not-an-srn".to_string()]);
    }

    #[tokio::test]
    async fn backend_fault_absorbs_into_item_outcome() {
        let srn = "srn:type:work-product/WellLog:1";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(srn, "work-product/WellLog"))
            .with_record(SrnRecord {
                srn: srn.to_string(),
                record_id: "rec-9".to_string(),
            });
        let records = ScriptedRecords::new().failing_record("rec-9");

        let response = resolver(store, records)
            .resolve(&srns(&[srn]), None, &headers())
            .await;

        assert!(response.result.is_empty());
        assert_eq!(response.unprocessed_srns, vec![srn.to_string()]);
    }

    #[tokio::test]
    async fn versionless_srn_resolves_through_latest_mapping() {
        let versionless = "srn:type:work-product/WellLog";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(
                "srn:type:work-product/WellLog:3",
                "work-product/WellLog",
            ))
            .with_record(SrnRecord {
                srn: versionless.to_string(),
                record_id: "rec-1".to_string(),
            });
        let records = ScriptedRecords::new().with_record(data_record("rec-1"));

        let response = resolver(store, records)
            .resolve(&srns(&[versionless]), None, &headers())
            .await;

        assert_eq!(response.result.len(), 1);
        assert_eq!(response.result[0].kind, OutcomeKind::Data);
    }

    #[tokio::test]
    async fn every_input_appears_exactly_once() {
        let s1 = "srn:type:work-product/WellLog:1";
        let store = StaticMappingStore::new()
            .with_entry(schema_entry(s1, "work-product/WellLog"))
            .with_record(SrnRecord {
                srn: s1.to_string(),
                record_id: "rec-1".to_string(),
            });
        let records = ScriptedRecords::new().with_record(data_record("rec-1"));

        let input = srns(&[s1, "bad-1", "srn:type:file/csv:1", "bad-2"]);
        let response = resolver(store, records)
            .resolve(&input, None, &headers())
            .await;

        assert_eq!(response.result.len() + response.unprocessed_srns.len(), input.len());
        let mut seen: Vec<String> = response
            .result
            .iter()
            .map(|i| i.srn.clone())
            .chain(response.unprocessed_srns.iter().cloned())
            .collect();
        seen.sort();
        let mut expected = input.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
