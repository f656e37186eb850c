// tests/web.rs
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // for .oneshot()

use dynhub::app_state::AppState;
use dynhub::config_loader::{AgentConfig, RegistryConfig, RetentionConfig};
use dynhub::store::RegistryStore;
use dynhub::store_sled::SledRegistryStore;
use dynhub::web::build_registry_router;

const AUTH: &str = "test-secret";

fn test_config(max_log_rows: usize, max_ips_per_service: usize) -> RegistryConfig {
    RegistryConfig {
        auth_code: AUTH.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: String::new(),
        retention: RetentionConfig {
            max_log_rows,
            max_ips_per_service,
        },
        agent: AgentConfig::default(),
    }
}

/// Router plus a handle on the underlying store for direct inspection.
fn test_app(
    config: RegistryConfig,
) -> (Router, Arc<Mutex<dyn RegistryStore>>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = SledRegistryStore::new(dir.path().to_str().unwrap()).expect("store should open");
    let store: Arc<Mutex<dyn RegistryStore>> = Arc::new(Mutex::new(store));
    let state = Arc::new(AppState::new(config, Arc::clone(&store)));
    (build_registry_router(state), store, dir)
}

async fn post(app: &Router, body: String) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri("/")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).expect("response should be JSON");
    (status, value)
}

fn envelope(request_type: &str, service_name: &str, ip: &str) -> String {
    json!({
        "authCode": AUTH,
        "requestType": request_type,
        "serviceName": service_name,
        "ip": ip,
    })
    .to_string()
}

#[tokio::test]
async fn update_then_request_returns_latest_ip() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let (status, body) = post(&app, envelope("UPDATE_IP", "serviceA", "1.1.1.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["value"], "OK");

    post(&app, envelope("UPDATE_IP", "serviceA", "2.2.2.2")).await;

    let (status, body) = post(&app, envelope("REQUEST_IP", "serviceA", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["value"], "2.2.2.2");
}

#[tokio::test]
async fn invalid_authcode_is_rejected_without_mutation() {
    let (app, store, _dir) = test_app(test_config(100, 10));

    let bad = json!({
        "authCode": "wrong",
        "requestType": "UPDATE_IP",
        "serviceName": "serviceA",
        "ip": "1.1.1.1",
    })
    .to_string();

    let (status, body) = post(&app, bad).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "INVALID AUTHCODE");
    assert_eq!(body["value"], Value::Null);

    let rows = store.lock().unwrap().read_ip_history().expect("read");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn missing_authcode_is_also_a_401() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let (status, body) = post(&app, json!({ "requestType": "REQUEST_NETWORK" }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn per_service_history_is_capped() {
    let (app, store, _dir) = test_app(test_config(100, 2));

    for ip in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
        post(&app, envelope("UPDATE_IP", "serviceA", ip)).await;
    }

    let (_, body) = post(&app, envelope("REQUEST_IP", "serviceA", "")).await;
    assert_eq!(body["value"], "3.3.3.3");

    let rows = store.lock().unwrap().read_ip_history().expect("read");
    let ips: Vec<&str> = rows
        .iter()
        .filter(|r| r.service_name == "serviceA")
        .map(|r| r.ip.as_str())
        .collect();
    assert_eq!(ips, vec!["2.2.2.2", "3.3.3.3"]);
}

#[tokio::test]
async fn network_lists_latest_ip_per_service_most_recent_first() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    post(&app, envelope("UPDATE_IP", "alpha", "1.1.1.1")).await;
    post(&app, envelope("UPDATE_IP", "beta", "2.2.2.2")).await;
    post(&app, envelope("UPDATE_IP", "alpha", "3.3.3.3")).await;
    // Empty-only service must not appear.
    post(&app, envelope("UPDATE_IP", "ghost", "")).await;

    let (status, body) = post(&app, envelope("REQUEST_NETWORK", "", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(
        body["value"],
        json!([["alpha", "3.3.3.3"], ["beta", "2.2.2.2"]])
    );
}

#[tokio::test]
async fn request_ip_for_unknown_service_is_a_defined_not_found() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let (status, body) = post(&app, envelope("REQUEST_IP", "nobody", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 404);
    assert_eq!(body["value"], Value::Null);
}

#[tokio::test]
async fn unrecognized_request_type_yields_400_envelope() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let (status, body) = post(&app, envelope("MAKE_COFFEE", "serviceA", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("MAKE_COFFEE"));
}

#[tokio::test]
async fn malformed_body_yields_500_envelope_at_transport_200() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let (status, body) = post(&app, "{not json".to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 500);
    assert_eq!(body["message"], "Server error");
}

#[tokio::test]
async fn raw_request_body_is_recorded_in_activity_log() {
    let (app, store, _dir) = test_app(test_config(100, 10));

    post(&app, envelope("UPDATE_IP", "serviceA", "1.1.1.1")).await;

    let rows = store.lock().unwrap().read_activity_log().expect("read");
    let received = rows
        .iter()
        .find(|r| r.event_name == "POST received")
        .expect("POST received row should exist");
    assert!(received.message.contains("serviceA"));
    assert!(received.message.contains("1.1.1.1"));
}

#[tokio::test]
async fn activity_log_stays_within_its_cap() {
    let cap = 5;
    let (app, store, _dir) = test_app(test_config(cap, 10));

    for i in 0..10 {
        post(&app, envelope("UPDATE_IP", "serviceA", &format!("10.0.0.{i}"))).await;
    }

    let count = store.lock().unwrap().log_row_count().expect("count");
    assert!(count <= cap, "log has {count} rows, cap is {cap}");
}

#[tokio::test]
async fn get_placeholder_and_healthz_respond() {
    let (app, _store, _dir) = test_app(test_config(100, 10));

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
}
