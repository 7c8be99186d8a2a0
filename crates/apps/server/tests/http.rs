//! Router-level tests: requests go through the full middleware stack
//! in-process, without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::AssetStore;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use server::build_router;
use tower::ServiceExt;

fn store() -> Arc<AssetStore> {
    let raw = json!([
        { "id": "1", "name": "Alpha Tower", "type": "building", "height": 50.0, "centroid": [10.0, 10.0] },
        { "id": "2", "name": "Beta Road", "type": "road", "height": null, "centroid": [20.0, 20.0] },
        { "id": "3", "name": "Gamma Cafe", "type": "poi", "centroid": [10.0, 12.0] },
        { "id": "a/b", "name": "Slash House", "type": "building", "height": 7.5, "centroid": [0.0, 0.0] }
    ]);
    let bytes = serde_json::to_vec(&raw).unwrap();
    Arc::new(AssetStore::from_json_slice(&bytes).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = build_router(store())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn ids(body: &Value) -> Vec<&str> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_dataset() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["assets"], json!(4));
    assert_eq!(body["dataset"].as_str().unwrap(), store().fingerprint());
}

#[tokio::test]
async fn unfiltered_list_returns_everything_in_order() {
    let (status, body) = get("/api/assets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(4));
    assert_eq!(ids(&body), vec!["1", "2", "3", "a/b"]);
    assert_eq!(body["items"][1]["height"], Value::Null);
    assert_eq!(body["items"][0]["type"], json!("building"));
}

#[tokio::test]
async fn bbox_and_type_combine() {
    let (_, body) = get("/api/assets?bbox=5,5,15,15&type=building").await;
    assert_eq!(ids(&body), vec!["1"]);
    assert_eq!(body["total"], json!(1));
}

#[tokio::test]
async fn malformed_parameters_are_ignored() {
    let (status, body) =
        get("/api/assets?bbox=1,2,3&minHeight=tall&limit=lots&offset=-4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(4));
    assert_eq!(ids(&body).len(), 4);
}

#[tokio::test]
async fn unrecognized_type_matches_nothing() {
    let (status, body) = get("/api/assets?type=bridge").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "items": [], "total": 0 }));
}

#[tokio::test]
async fn search_is_case_insensitive_and_decoded() {
    let (_, body) = get("/api/assets?q=gamma%20CAFE").await;
    assert_eq!(ids(&body), vec!["3"]);
}

#[tokio::test]
async fn pagination_reports_full_total() {
    let (_, body) = get("/api/assets?limit=2&offset=1").await;
    assert_eq!(ids(&body), vec!["2", "3"]);
    assert_eq!(body["total"], json!(4));

    let (_, body) = get("/api/assets?offset=10").await;
    assert_eq!(ids(&body), Vec::<&str>::new());
    assert_eq!(body["total"], json!(4));
}

#[tokio::test]
async fn repeated_key_uses_first_value() {
    let (_, body) = get("/api/assets?type=road&type=poi").await;
    assert_eq!(ids(&body), vec!["2"]);
}

#[tokio::test]
async fn asset_by_id() {
    let (status, body) = get("/api/assets/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Gamma Cafe"));
    assert_eq!(body["centroid"], json!([10.0, 12.0]));

    let (status, body) = get("/api/assets/a%2Fb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!("a/b"));
}

#[tokio::test]
async fn missing_asset_is_404() {
    let (status, body) = get("/api/assets/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not_found", "id": "999" }));
}
