//! HTTP API tests driving the router directly

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use helpers::*;
use http_body_util::BodyExt;
use raidprog_common::config::DisplayCategory;
use raidprog_ingest::services::identity::character_hash;
use raidprog_ingest::services::{ClientRateLimiter, ImportQueue, SyncEngine};
use raidprog_ingest::{build_router, db, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

const REPORT: &str = "Xy7Kq2LmNp4RsT9v";

async fn create_test_app(rate_limit: Duration) -> (Router, SqlitePool, Arc<ImportQueue>) {
    let pool = db::init_memory_pool().await.expect("Failed to create in-memory database");
    let queue = Arc::new(ImportQueue::new());
    let categories = vec![DisplayCategory {
        name: "Abyssos (Savage)".to_string(),
        boss_ids: vec![P6S - 1000, P5S - 1000],
    }];
    let state = AppState::new(
        pool.clone(),
        Arc::clone(&queue),
        ClientRateLimiter::new(rate_limit),
        categories,
    );
    (build_router(state), pool, queue)
}

fn import_request(client: &str, report: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/import?r={}", report))
        .header("x-real-ip", client)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool, _queue) = create_test_app(Duration::ZERO).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "raidprog-ingest");
    assert_eq!(json["queue_state"], "idle");
}

#[tokio::test]
async fn test_import_accepted_and_queued() {
    let (app, _pool, queue) = create_test_app(Duration::ZERO).await;

    let response = app.clone().oneshot(import_request("10.0.0.1", REPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["report_id"], REPORT);
    assert_eq!(json["queue_length"], 1);

    let response = app.oneshot(get("/import/queue")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["state"], "pending");
    assert_eq!(json["pending"][0], REPORT);
    assert!(json["processing"].is_null());
    assert_eq!(queue.len().await, 1);
}

#[tokio::test]
async fn test_import_url_form_accepted() {
    let (app, _pool, _queue) = create_test_app(Duration::ZERO).await;

    let url = format!("https://www.fflogs.com/reports/{}", REPORT);
    let response = app.oneshot(import_request("10.0.0.1", &url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["report_id"], REPORT);
}

#[tokio::test]
async fn test_import_invalid_report_is_bad_request() {
    let (app, _pool, queue) = create_test_app(Duration::ZERO).await;

    let response = app.oneshot(import_request("10.0.0.1", "nonsense")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_import_without_client_address_rejected() {
    let (app, _pool, _queue) = create_test_app(Duration::ZERO).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/import?r={}", REPORT))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_duplicate_is_conflict() {
    let (app, _pool, _queue) = create_test_app(Duration::ZERO).await;

    let response = app.clone().oneshot(import_request("10.0.0.1", REPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app.oneshot(import_request("10.0.0.2", REPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_import_already_imported_is_bad_request() {
    let (app, pool, queue) = create_test_app(Duration::ZERO).await;
    db::imports::record(&pool, REPORT).await.unwrap();

    let response = app.oneshot(import_request("10.0.0.1", REPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_import_rate_limited() {
    let (app, _pool, _queue) = create_test_app(Duration::from_secs(60)).await;

    let response = app.clone().oneshot(import_request("10.0.0.1", REPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(import_request("10.0.0.1", "aaaaaaaaaaaaaaaa"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other clients are unaffected
    let response = app.oneshot(import_request("10.0.0.2", "aaaaaaaaaaaaaaaa")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_search() {
    let (app, pool, _queue) = create_test_app(Duration::ZERO).await;
    let report = ReportBuilder::new()
        .attempt(attempt(1, P5S, false, 4500, 0, 300_000))
        .character(character("Tataru Taru", "Scholar", &[1]))
        .character(character("Alphinaud Leveilleur", "Sage", &[1]))
        .build();
    SyncEngine::new(pool).handle_report("reportAAAAAAAAAA", &report).await.unwrap();

    let response = app.clone().oneshot(get("/search?n=taru")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Tataru Taru");
    assert_eq!(results[0]["job_abbreviation"], "sch");
    assert!(results[0].get("compare_hash").is_none());

    let response = app.oneshot(get("/search?n=%20%20")).await.unwrap();
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_character_not_found() {
    let (app, _pool, _queue) = create_test_app(Duration::ZERO).await;

    let response = app.clone().oneshot(get("/characters/abc123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");

    let response = app.oneshot(get("/characters/not-an-id")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_character_progression() {
    let (app, pool, _queue) = create_test_app(Duration::ZERO).await;
    let mut dungeon = attempt(3, DUNGEON, true, 0, 1_000_000, 1_100_000);
    dungeon.zone_name = "The Dead Ends".to_string();
    let report = ReportBuilder::new()
        .attempt(attempt(1, P5S, true, 0, 0, 420_000))
        .attempt(attempt(2, P6S, false, 5200, 500_000, 800_000))
        .attempt(dungeon)
        .character(character("Tataru Taru", "Scholar", &[1, 2, 3]))
        .build();
    SyncEngine::new(pool.clone())
        .handle_report("reportAAAAAAAAAA", &report)
        .await
        .unwrap();

    let character = db::characters::find_by_hash(&pool, &character_hash("Tataru Taru", "Gilgamesh"))
        .await
        .unwrap()
        .unwrap();

    // Public ids are matched case-insensitively
    let uri = format!("/characters/{}", character.public_id.to_uppercase());
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["character"]["name"], "Tataru Taru");
    assert_eq!(json["character"]["public_id"], character.public_id);

    // Kill first, then wipes; normal content hidden by default
    let progression = json["progression"].as_array().unwrap();
    assert_eq!(progression.len(), 2);
    assert_eq!(progression[0]["is_kill"], true);
    assert_eq!(progression[0]["encounter"]["zone_id"], P5S);
    assert_eq!(progression[0]["report_id"], "reportAAAAAAAAAA");
    assert_eq!(progression[1]["fight_percentage"], 5200);

    // Display groups follow the configured boss order
    let groups = json["encounter_groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["category"], "Abyssos (Savage)");
    assert_eq!(groups[0]["encounters"][0]["zone_id"], P6S);
    assert_eq!(groups[0]["encounters"][1]["zone_id"], P5S);

    let response = app.oneshot(get(&format!("{}?all=true", uri))).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["progression"].as_array().unwrap().len(), 3);
}
