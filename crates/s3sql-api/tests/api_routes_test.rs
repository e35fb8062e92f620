//! Router tests against the in-memory catalog and presign backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use s3sql_api::{router, AppConfig, AppState};
use s3sql_core::FileRecord;
use s3sql_db::{InMemoryFileRepository, InMemoryPresignBackend};

fn record(path: &str, size: i64, month: u32, day: u32) -> FileRecord {
    FileRecord::new(
        path.rsplit('/').next().unwrap(),
        size,
        Utc.with_ymd_and_hms(2024, month, day, 8, 0, 0).unwrap(),
        path,
        format!("https://acct.example.com/api/files/S3DB/APP_DATA/RAW_STAGE/{}", path),
    )
}

struct Harness {
    app: Router,
    repo: Arc<InMemoryFileRepository>,
    presign: Arc<InMemoryPresignBackend>,
}

fn harness() -> Harness {
    let repo = Arc::new(InMemoryFileRepository::new(vec![
        record("data/REPORT_2024.csv", 500_000, 1, 20),
        record("data/summary.csv", 2_000_000, 1, 10),
        record("users/user_7.csv", 1_000, 2, 5),
        record("users/user_seven.csv", 1_000, 2, 1),
    ]));
    let presign = Arc::new(
        InMemoryPresignBackend::new("https://signed.example")
            .fail_on("data/summary.csv", "object is archived"),
    );
    let state = AppState::new(repo.clone(), presign.clone(), &AppConfig::default());
    Harness {
        app: router(state),
        repo,
        presign,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn paths(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["relative_path"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_request_id_header_is_set() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_search_without_filters_returns_most_recent_first() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/v1/files/search").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        paths(&body),
        vec![
            "users/user_7.csv",
            "users/user_seven.csv",
            "data/REPORT_2024.csv",
            "data/summary.csv"
        ]
    );
    assert_eq!(body["total"], 4);
    assert_eq!(body["summary"]["total_files"], 4);
    assert_eq!(body["active_filters"], json!([]));
    assert_eq!(body["cached"], false);
    assert_eq!(body["results"][0]["stage_name"], "RAW_STAGE");
}

#[tokio::test]
async fn test_case_insensitive_substring() {
    let h = harness();
    let (_, body) = get(&h.app, "/api/v1/files/search?pattern=report").await;
    assert_eq!(paths(&body), vec!["data/REPORT_2024.csv"]);
    assert_eq!(
        body["active_filters"][0],
        "File Pattern: `report` (Pattern, Case Insensitive)"
    );
}

#[tokio::test]
async fn test_regex_pattern() {
    let h = harness();
    let (_, body) = get(&h.app, "/api/v1/files/search?pattern=user_%5B0-9%5D&regex=true").await;
    assert_eq!(paths(&body), vec!["users/user_7.csv"]);
}

#[tokio::test]
async fn test_size_range_in_kb() {
    let h = harness();
    let (_, body) = get(
        &h.app,
        "/api/v1/files/search?size_filter=true&min_size=0&max_size=1000&size_unit=KB",
    )
    .await;
    let found = paths(&body);
    assert!(found.contains(&"data/REPORT_2024.csv".to_string()));
    assert!(!found.contains(&"data/summary.csv".to_string()));
}

#[tokio::test]
async fn test_date_range_inclusive_of_end_day() {
    let h = harness();
    let (_, body) = get(
        &h.app,
        "/api/v1/files/search?date_filter=true&start_date=2024-01-01&end_date=2024-01-20",
    )
    .await;
    assert_eq!(paths(&body), vec!["data/REPORT_2024.csv", "data/summary.csv"]);
    assert_eq!(body["active_filters"][0], "Date Range: 2024-01-01 to 2024-01-20");
}

#[tokio::test]
async fn test_inverted_ranges_rejected_without_query() {
    let h = harness();
    let (status, body) = get(
        &h.app,
        "/api/v1/files/search?start_date=2024-02-01&end_date=2024-01-01\
         &min_size=10&max_size=1&size_unit=MB",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"].as_array().unwrap().len(), 2);
    assert!(body["error"].as_str().unwrap().contains("Start date"));
    assert_eq!(h.repo.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_regex_rejected() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/v1/files/search?pattern=%28open&regex=true").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["kind"], "invalid_regex");
}

#[tokio::test]
async fn test_no_matches_is_ok_and_empty() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/v1/files/search?pattern=nothing-here").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_query_failure_is_server_error() {
    let h = harness();
    h.repo.set_failure(Some("warehouse offline"));
    let (status, body) = get(&h.app, "/api/v1/files/search").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("warehouse offline"));
}

#[tokio::test]
async fn test_repeat_search_served_from_cache_until_invalidated() {
    let h = harness();
    let uri = "/api/v1/files/search?pattern=late";

    let (_, first) = get(&h.app, uri).await;
    assert_eq!(first["total"], 0);

    h.repo.insert(record("data/late.csv", 10, 3, 1));
    let (_, second) = get(&h.app, uri).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["total"], 0);
    assert_eq!(h.repo.call_count(), 1);

    let (status, cleared) = post(&h.app, "/api/v1/cache/invalidate", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["search_entries_cleared"], 1);

    let (_, third) = get(&h.app, uri).await;
    assert_eq!(third["cached"], false);
    assert_eq!(third["total"], 1);
}

#[tokio::test]
async fn test_mint_links_batch_with_failing_row() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/api/v1/files/links",
        json!({
            "files": [
                {"file_name": "REPORT_2024.csv", "relative_path": "data/REPORT_2024.csv", "stage_name": "RAW_STAGE", "size": 500000},
                {"file_name": "summary.csv", "relative_path": "data/summary.csv", "stage_name": "RAW_STAGE", "size": 2000000},
                {"file_name": "user_7.csv", "relative_path": "users/user_7.csv", "stage_name": "RAW_STAGE", "size": 1000}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let links = body["links"].as_array().unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(
        links[0]["download_url"],
        "https://signed.example/RAW_STAGE/data/REPORT_2024.csv?expires=900"
    );
    assert_eq!(links[1]["download_url"], "Error: object is archived");
    assert_eq!(links[1]["success"], false);
    assert_eq!(links[2]["relative_path"], "users/user_7.csv");
    assert_eq!(links[2]["success"], true);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["selection"]["selected_count"], 3);
    assert_eq!(body["selection"]["selected_size_bytes"], 2_501_000);
    assert_eq!(h.presign.call_count(), 3);
}

#[tokio::test]
async fn test_mint_links_reuses_cached_url() {
    let h = harness();
    let body = json!({
        "files": [{"file_name": "user_7.csv", "relative_path": "users/user_7.csv", "stage_name": "RAW_STAGE"}]
    });

    post(&h.app, "/api/v1/files/links", body.clone()).await;
    post(&h.app, "/api/v1/files/links", body).await;
    assert_eq!(h.presign.call_count(), 1);
}

#[tokio::test]
async fn test_empty_selection_rejected() {
    let h = harness();
    let (status, body) = post(&h.app, "/api/v1/files/links", json!({ "files": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert_eq!(h.presign.call_count(), 0);
}

#[tokio::test]
async fn test_size_unit_is_case_insensitive() {
    let h = harness();
    let (status, body) = get(
        &h.app,
        "/api/v1/files/search?min_size=0&max_size=1000&size_unit=kb",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(paths(&body).contains(&"data/REPORT_2024.csv".to_string()));
    assert!(!paths(&body).contains(&"data/summary.csv".to_string()));
}

#[tokio::test]
async fn test_malformed_query_gets_json_error() {
    let h = harness();

    let (status, body) = get(&h.app, "/api/v1/files/search?size_unit=TB").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unknown size unit"));

    let (status, body) = get(&h.app, "/api/v1/files/search?end_date=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert_eq!(h.repo.call_count(), 0);
}

#[tokio::test]
async fn test_last_representable_end_date_rejected() {
    let h = harness();
    let (status, body) = get(
        &h.app,
        "/api/v1/files/search?start_date=2024-01-01&end_date=%2B262142-12-31",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["kind"], "date_out_of_range");
    assert_eq!(h.repo.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_links_body_gets_json_error() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/v1/files/links")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"files\": ["))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_selection_size_total_saturates() {
    let h = harness();
    let file = json!({
        "file_name": "user_7.csv",
        "relative_path": "users/user_7.csv",
        "stage_name": "RAW_STAGE",
        "size": i64::MAX
    });
    let (status, body) = post(
        &h.app,
        "/api/v1/files/links",
        json!({ "files": [file.clone(), file] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"]["selected_count"], 2);
    assert_eq!(body["selection"]["selected_size_bytes"], i64::MAX);
}
