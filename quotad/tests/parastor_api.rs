//! ParaStor backend tests against a mock REST server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use quota_proto::quota_target::Scope;
use quota_proto::{ClearQuotaRequest, GetQuotaRequest, ListQuotasRequest, QuotaTarget, SetQuotaRequest};
use quotad::storage::parastor;
use quotad::storage::{BackendConfig, QuotaBackend, StorageError};

const GOOD_PASSWORD: &str = "secret";
const TOKEN: &str = "tok-123";

#[derive(Default)]
struct MockState {
    // Composed path ("fs:/dir") to hard threshold.
    quotas: Mutex<HashMap<String, u64>>,
    quota_hits: AtomicU32,
}

fn envelope_ok(result: Value) -> Json<Value> {
    Json(json!({ "err_no": 200, "err_msg": "", "result": result }))
}

fn envelope_err(err_no: i64, msg: &str) -> Json<Value> {
    Json(json!({ "err_no": err_no, "err_msg": msg, "result": null }))
}

fn body_path(body: &Value) -> String {
    body["quota_operate_views"][0]["absolute_path"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

async fn rest_login(Query(params): Query<HashMap<String, String>>) -> impl axum::response::IntoResponse {
    if params.get("password").map(String::as_str) != Some(GOOD_PASSWORD) {
        return (
            StatusCode::OK,
            [("token", "")],
            envelope_err(1021, "invalid username or password"),
        );
    }
    (StatusCode::OK, [("token", TOKEN)], envelope_ok(Value::Null))
}

async fn node_total() -> Json<Value> {
    envelope_ok(json!({ "node_total": 3 }))
}

async fn quota_add(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.quota_hits.fetch_add(1, Ordering::SeqCst);
    let path = params.get("path").cloned().unwrap_or_default();
    if path.ends_with("/forbidden") {
        return envelope_err(500, "quota conflicts with an existing quota");
    }
    let threshold: u64 = params
        .get("logical_hard_threshold")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    state.quotas.lock().await.insert(path, threshold);
    envelope_ok(Value::Null)
}

async fn quota_info(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.quota_hits.fetch_add(1, Ordering::SeqCst);
    let path = body_path(&body);
    let quotas = state.quotas.lock().await;
    match quotas.get(&path) {
        Some(threshold) => envelope_ok(json!({
            "quotas": [{
                "path": path,
                "logical_hard_threshold": threshold,
                "logical_used_capacity": 4096,
                "state": "",
            }],
            "total": 1,
        })),
        None => envelope_ok(json!({ "quotas": [], "total": 0 })),
    }
}

async fn quota_list(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.quota_hits.fetch_add(1, Ordering::SeqCst);
    let quotas = state.quotas.lock().await;
    let records: Vec<Value> = quotas
        .iter()
        .map(|(path, threshold)| {
            json!({
                "path": path,
                "logical_hard_threshold": threshold,
                "logical_used_capacity": 0,
                "state": "",
            })
        })
        .collect();
    envelope_ok(json!({ "quotas": records, "total": records.len() }))
}

async fn quota_delete(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.quota_hits.fetch_add(1, Ordering::SeqCst);
    // Deleting an absent quota is not an error on the real server either.
    state.quotas.lock().await.remove(&body_path(&body));
    envelope_ok(Value::Null)
}

async fn spawn_mock() -> (Arc<MockState>, String, u16) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/restLogin", post(rest_login))
        .route("/node/total", get(node_total))
        .route("/quota/add", post(quota_add))
        .route("/quota/info", post(quota_info))
        .route("/quota/list", post(quota_list))
        .route("/quota/delete", delete(quota_delete))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr.ip().to_string(), addr.port())
}

fn backend_config(ip: &str, port: u16, password: &str) -> BackendConfig {
    BackendConfig {
        ip: ip.to_string(),
        port,
        username: "admin".to_string(),
        password: password.to_string(),
        filesystem_name: "fsA".to_string(),
        root_path: "/exports".to_string(),
        shutdown: CancellationToken::new(),
    }
}

fn path_target(id: &str) -> QuotaTarget {
    QuotaTarget {
        scope: Scope::Path as i32,
        id: id.to_string(),
    }
}

#[tokio::test]
async fn set_then_get_round_trips_one_gibibyte() {
    let (_state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    backend
        .set_quota(SetQuotaRequest {
            target: Some(path_target("/proj")),
            size_bytes: 1 << 30,
        })
        .await
        .unwrap();

    let entry = backend
        .get_quota(GetQuotaRequest {
            target: Some(path_target("/proj")),
        })
        .await
        .unwrap()
        .entry
        .unwrap();

    assert_eq!(entry.size_bytes, 1 << 30);
    assert_eq!(entry.used_bytes, 4096);
    assert!(entry.size_quota_enabled);
    assert!(!entry.inode_quota_enabled);
    assert_eq!(entry.info.get("status").map(String::as_str), Some("ok"));
    // The composed path, not the raw target id, is what the server saw.
    let target = entry.target.unwrap();
    assert_eq!(target.id, "fsA:/exports/proj");
}

#[tokio::test]
async fn unsupported_scope_never_reaches_the_server() {
    let (state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    let mut target = path_target("42");
    target.set_scope(Scope::Id);
    let err = backend
        .set_quota(SetQuotaRequest {
            target: Some(target),
            size_bytes: 1,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::UnsupportedScope(s) if s == Scope::Id as i32));
    assert_eq!(state.quota_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_password_fails_construction_with_auth_error() {
    let (_state, ip, port) = spawn_mock().await;
    let err = parastor::new_backend(backend_config(&ip, port, "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Auth(msg) if msg.contains("invalid username")));
}

#[tokio::test]
async fn clearing_an_absent_quota_succeeds() {
    let (_state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    backend
        .clear_quota(ClearQuotaRequest {
            target: Some(path_target("/never-set")),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn application_level_rejection_passes_the_message_through() {
    let (_state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    let err = backend
        .set_quota(SetQuotaRequest {
            target: Some(path_target("/forbidden")),
            size_bytes: 1,
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, StorageError::BackendRejected(msg) if msg == "quota conflicts with an existing quota")
    );
}

#[tokio::test]
async fn missing_quota_is_not_found() {
    let (_state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    let err = backend
        .get_quota(GetQuotaRequest {
            target: Some(path_target("/nope")),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(path) if path == "fsA:/exports/nope"));
}

#[tokio::test]
async fn listing_is_a_reachability_check_with_an_empty_page() {
    let (_state, ip, port) = spawn_mock().await;
    let backend = parastor::new_backend(backend_config(&ip, port, GOOD_PASSWORD))
        .await
        .unwrap();

    backend
        .set_quota(SetQuotaRequest {
            target: Some(path_target("/proj")),
            size_bytes: 1 << 20,
        })
        .await
        .unwrap();

    let response = backend
        .list_quotas(ListQuotasRequest {
            limit: 0,
            continue_token: String::new(),
            target: Some(path_target("/proj")),
        })
        .await
        .unwrap();
    assert!(response.entries.is_empty());
    assert!(response.continue_token.is_empty());
}
