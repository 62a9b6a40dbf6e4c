//! Integration tests for wdg-delivery API endpoints
//!
//! Exercises the axum router against an in-memory mapping store and a
//! scripted record backend: bulk delivery classification, count
//! reconciliation, and header preconditions.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`
use wdg_delivery::client::testing::ScriptedRecords;
use wdg_delivery::client::Record;
use wdg_delivery::store::{SchemaEntry, SrnRecord, StaticMappingStore};
use wdg_delivery::{build_router, AppState};

fn setup_app(store: StaticMappingStore, records: ScriptedRecords) -> axum::Router {
    build_router(AppState::new(
        Arc::new(store),
        Arc::new(records),
        4,
        Duration::from_secs(5),
    ))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", "Bearer token")
        .header("data-partition-id", "tenant-a")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
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

fn record(id: &str, data: Value) -> Record {
    Record {
        id: id.to_string(),
        kind: None,
        data: data.as_object().unwrap().clone(),
    }
}

#[tokio::test]
async fn health_endpoint_reports_module() {
    let app = setup_app(StaticMappingStore::new(), ScriptedRecords::new());

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wdg-delivery");
}

#[tokio::test]
async fn mixed_batch_partitions_into_result_and_unprocessed() {
    // s1 resolves to inline data, s2 has no stored mapping.
    let s1 = "srn:type:work-product/WellLog:1";
    let s2 = "srn:type:work-product/Document:1";
    let store = StaticMappingStore::new()
        .with_entry(schema_entry(s1, "work-product/WellLog"))
        .with_record(SrnRecord {
            srn: s1.to_string(),
            record_id: "rec-1".to_string(),
        });
    let records = ScriptedRecords::new().with_record(record(
        "rec-1",
        json!({"osdu": {"ResourceName": "well 7"}}),
    ));
    let app = setup_app(store, records);

    let response = app
        .oneshot(post_json("/api/delivery", json!({"srns": [s1, s2]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"].as_array().unwrap().len(), 1);
    assert_eq!(body["result"][0]["srn"], s1);
    assert_eq!(body["result"][0]["kind"], "DATA");
    assert_eq!(body["result"][0]["data"], json!({"ResourceName": "well 7"}));
    assert_eq!(body["unprocessedSrns"], json!([s2]));
}

#[tokio::test]
async fn file_record_carries_signed_location() {
    let srn = "srn:type:file/las2:1";
    let store = StaticMappingStore::new()
        .with_entry(schema_entry(srn, "file/las2"))
        .with_record(SrnRecord {
            srn: srn.to_string(),
            record_id: "rec-2".to_string(),
        });
    let records = ScriptedRecords::new().with_record(record(
        "rec-2",
        json!({"bucketURL": "/bucket/well.las"}),
    ));
    let app = setup_app(store, records);

    let response = app
        .oneshot(post_json("/api/delivery", json!({"srns": [srn]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"][0]["kind"], "FILE");
    assert_eq!(
        body["result"][0]["fileLocation"],
        "https://signed.example/bucket/well.las"
    );
}

#[tokio::test]
async fn result_and_unprocessed_cover_every_input() {
    let s1 = "srn:type:work-product/WellLog:1";
    let store = StaticMappingStore::new()
        .with_entry(schema_entry(s1, "work-product/WellLog"))
        .with_record(SrnRecord {
            srn: s1.to_string(),
            record_id: "rec-1".to_string(),
        });
    let records = ScriptedRecords::new().with_record(record(
        "rec-1",
        json!({"osdu": {"ResourceName": "well 7"}}),
    ));
    let app = setup_app(store, records);

    let input = json!([s1, "garbage", "srn:type:file/pdf:9", s1]);
    let response = app
        .oneshot(post_json("/api/delivery", json!({"srns": input})))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    let resolved = body["result"].as_array().unwrap().len();
    let unprocessed = body["unprocessedSrns"].as_array().unwrap().len();
    assert_eq!(resolved + unprocessed, 4);
    // The duplicated s1 resolves twice.
    assert_eq!(resolved, 2);
}

#[tokio::test]
async fn delivery_without_authorization_is_401() {
    let app = setup_app(StaticMappingStore::new(), ScriptedRecords::new());

    let request = Request::builder()
        .method("POST")
        .uri("/api/delivery")
        .header("content-type", "application/json")
        .header("data-partition-id", "tenant-a")
        .body(Body::from(json!({"srns": ["srn:type:file/csv:1"]}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn delivery_without_partition_is_400() {
    let app = setup_app(StaticMappingStore::new(), ScriptedRecords::new());

    let request = Request::builder()
        .method("POST")
        .uri("/api/delivery")
        .header("content-type", "application/json")
        .header("authorization", "Bearer token")
        .body(Body::from(json!({"srns": ["srn:type:file/csv:1"]}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_srn_list_is_400() {
    let app = setup_app(StaticMappingStore::new(), ScriptedRecords::new());

    let response = app
        .oneshot(post_json("/api/delivery", json!({"srns": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn backend_fault_reports_srn_unprocessed() {
    let srn = "srn:type:work-product/WellLog:1";
    let store = StaticMappingStore::new()
        .with_entry(schema_entry(srn, "work-product/WellLog"))
        .with_record(SrnRecord {
            srn: srn.to_string(),
            record_id: "rec-9".to_string(),
        });
    let records = ScriptedRecords::new().failing_record("rec-9");
    let app = setup_app(store, records);

    let response = app
        .oneshot(post_json("/api/delivery", json!({"srns": [srn]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], json!([]));
    assert_eq!(body["unprocessedSrns"], json!([srn]));
}
