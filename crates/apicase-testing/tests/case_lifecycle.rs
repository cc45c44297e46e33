use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::FutureExt;
use serde_json::{Value, json};

use apicase_core::HarnessConfig;
use apicase_testing::{
    ApiTestCase, FixtureStore, HarnessError, TestFolders, assert_json_header, assert_response_code,
};

// ── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct RecordingStore {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl FixtureStore for RecordingStore {
    async fn purge(&self) -> Result<(), HarnessError> {
        self.events.lock().unwrap().push("purge".to_owned());
        Ok(())
    }

    async fn load(&self, files: &[PathBuf]) -> Result<usize, HarnessError> {
        let mut events = self.events.lock().unwrap();
        for file in files {
            let name = file.file_name().unwrap().to_string_lossy();
            events.push(format!("load {name}"));
        }
        Ok(files.len())
    }
}

fn folders() -> TestFolders {
    TestFolders::new(env!("CARGO_MANIFEST_DIR"), HarnessConfig::default())
}

// ── Router under test ────────────────────────────────────────────────────────

async fn show_order(Path(id): Path<u64>) -> impl IntoResponse {
    match id {
        7 => Json(json!({"id": 7, "status": "created", "total": 19.99})).into_response(),
        8 => Json(json!({"id": 8, "status": "pending", "total": 5})).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/problem+json")],
            json!({
                "type": "https://example.com/problems/not-found",
                "title": "Not Found",
                "status": 404,
            })
            .to_string(),
        )
            .into_response(),
    }
}

async fn create_order(Json(body): Json<Value>) -> impl IntoResponse {
    let total = body.get("total").cloned().unwrap_or(json!(0));
    (
        StatusCode::CREATED,
        Json(json!({"id": 9, "status": "created", "total": total})),
    )
}

async fn list_orders() -> Json<Value> {
    Json(json!({
        "items": [
            {"id": 7, "status": "created", "total": 19.99},
            {"id": 8, "status": "pending", "total": 5},
        ],
        "paging": {"page": 1, "per_page": 25},
    }))
}

fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(show_order))
}

// ── Cases ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_pass_order_created_expectation() {
    let store = RecordingStore::default();
    ApiTestCase::run(router(), store.clone(), folders(), |case| async move {
        let response = case.get("/orders/7").await;
        case.assert_response(&response, "order_created", StatusCode::OK);
    })
    .await
    .unwrap();

    assert_eq!(store.events(), ["purge", "purge"]);
}

#[tokio::test]
async fn should_accept_created_order_posted_as_json() {
    ApiTestCase::run(router(), RecordingStore::default(), folders(), |case| async move {
        let response = case.post_json("/orders", &json!({"total": 12.5})).await;
        case.assert_response(&response, "order_created", StatusCode::CREATED);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn should_expect_problem_json_for_errors() {
    ApiTestCase::run(router(), RecordingStore::default(), folders(), |case| async move {
        let response = case.get("/orders/404").await;
        assert_response_code(&response, StatusCode::NOT_FOUND);
        assert_json_header(&response);
        case.assert_response_content(&response, "order_not_found");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn should_allow_trailing_elements_after_unbounded_token() {
    ApiTestCase::run(router(), RecordingStore::default(), folders(), |case| async move {
        let response = case.get("/orders").await;
        case.assert_response(&response, "order_list", StatusCode::OK);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn should_purge_and_report_after_mismatch() {
    let store = RecordingStore::default();
    let outcome = AssertUnwindSafe(ApiTestCase::run(
        router(),
        store.clone(),
        folders(),
        |case| async move {
            let response = case.get("/orders/8").await;
            case.assert_response(&response, "order_created", StatusCode::OK);
        },
    ))
    .catch_unwind()
    .await;

    let panic = outcome.unwrap_err();
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(message.contains(r#"root.status: expected "created", got string "pending""#), "{message}");
    assert!(message.contains(r#"-  "status": "created""#), "{message}");
    assert!(message.contains(r#"+  "status": "pending""#), "{message}");
    assert_eq!(store.events(), ["purge", "purge"]);
}

#[tokio::test]
async fn should_persist_queued_fixtures_in_order() {
    let store = RecordingStore::default();
    ApiTestCase::run(router(), store.clone(), folders(), |mut case| async move {
        case.add_fixture_files(["orders/users.yml", "orders/orders.yml"])
            .unwrap();
        assert_eq!(case.persist_fixtures().await.unwrap(), 2);
        assert_eq!(case.persist_fixtures().await.unwrap(), 0);
    })
    .await
    .unwrap();

    assert_eq!(
        store.events(),
        ["purge", "load users.yml", "load orders.yml", "purge"]
    );
}

#[tokio::test]
async fn should_load_fixture_directory_sorted() {
    let store = RecordingStore::default();
    ApiTestCase::run(router(), store.clone(), folders(), |case| async move {
        assert_eq!(case.load_fixtures_from_directory("orders").await.unwrap(), 2);
    })
    .await
    .unwrap();

    assert_eq!(
        store.events(),
        ["purge", "load orders.yml", "load users.yml", "purge"]
    );
}

#[tokio::test]
async fn should_reject_missing_fixture_file() {
    let mut case = ApiTestCase::setup(router(), RecordingStore::default(), folders())
        .await
        .unwrap();
    let err = case.add_fixture_files(["orders/missing.yml"]).unwrap_err();
    assert_eq!(err.kind(), "CONFIGURATION");
    assert!(err.to_string().contains("missing.yml does not exist"));
    case.teardown().await.unwrap();
}

#[tokio::test]
async fn should_resolve_default_folders_under_crate_root() {
    let case = ApiTestCase::setup(router(), RecordingStore::default(), folders())
        .await
        .unwrap();
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    assert_eq!(case.fixtures_folder(), root.join("tests").join("fixtures"));
    assert_eq!(
        case.expectations().folder(),
        root.join("tests").join("responses")
    );
    case.teardown().await.unwrap();
}
