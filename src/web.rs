//! HTTP surface of the registry.
//!
//! A single `POST /` endpoint carries every operation; the request type is a
//! field of the JSON body, and the logical status lives in the response
//! envelope while the transport status is always 200. `GET /` is a no-op
//! placeholder kept for clients that probe the base URL.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::activity_log::{self, LogEntry};
use crate::app_state::AppState;
use crate::errors::{RegistryError, RegistryResult};
use crate::ip_history::{self, IpHistoryEntry};
use crate::retention;
use crate::store::RegistryStore;

/// Inbound request body. Fields default to empty so that a missing
/// `authCode` is an authorization failure and a missing `requestType` an
/// unrecognized request, not a parse error.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// Shared secret; skipped when serializing so the parsed-contents log
    /// row does not repeat it.
    #[serde(default, skip_serializing)]
    pub auth_code: String,
    #[serde(default)]
    pub request_type: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub ip: String,
}

/// Outbound envelope: `{ status, message, value }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub message: String,
    pub value: Value,
}

impl ResponseEnvelope {
    pub fn new(status: u16, message: impl Into<String>, value: Value) -> Self {
        ResponseEnvelope {
            status,
            message: message.into(),
            value,
        }
    }

    pub fn server_error() -> Self {
        Self::new(500, "Server error", Value::Null)
    }
}

/// Build the registry router over the shared state.
pub fn build_registry_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_post).get(handle_get))
        .route("/healthz", get(healthz))
        .layer(Extension(state))
}

#[axum::debug_handler]
async fn handle_post(
    Extension(state): Extension<Arc<AppState>>,
    body: String,
) -> Json<ResponseEnvelope> {
    let trace_id = Uuid::new_v4();
    state
        .activity
        .notice("POST received", format!("[{trace_id}] {body}"));

    let envelope = match dispatch(&state, trace_id, &body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(%trace_id, "error handling POST request: {e}");
            state
                .activity
                .notice("ERROR", format!("[{trace_id}] error handling POST request: {e}"));
            ResponseEnvelope::server_error()
        }
    };

    state.activity.payload("RESPONSE", &envelope);

    if let Err(e) = trim_activity_log(&state) {
        tracing::warn!(%trace_id, "activity log retention failed: {e}");
    }

    Json(envelope)
}

/// Parse, authorize, and execute one request.
fn dispatch(state: &AppState, trace_id: Uuid, body: &str) -> RegistryResult<ResponseEnvelope> {
    let req: ApiRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(e) => {
            state
                .activity
                .notice("ERROR", format!("[{trace_id}] could not parse request body: {e}"));
            return Ok(ResponseEnvelope::server_error());
        }
    };
    state.activity.payload("CONTENTS", &req);

    if req.auth_code != state.config.auth_code {
        state
            .activity
            .notice("AUTHORIZATION DENIED", format!("[{trace_id}] invalid authCode"));
        return Ok(ResponseEnvelope::new(401, "INVALID AUTHCODE", Value::Null));
    }
    state
        .activity
        .notice("AUTHORIZATION GRANTED", format!("[{trace_id}] granted"));
    state
        .activity
        .notice("REQUEST RECEIVED", format!("[{trace_id}] {}", req.request_type));

    // One guard across the whole operation; in-dispatch log rows go through
    // the held guard rather than the recorder, which would re-lock.
    let guard = state
        .store
        .lock()
        .map_err(|_| RegistryError::LockPoisoned)?;
    let store: &dyn RegistryStore = &*guard;

    match req.request_type.as_str() {
        "UPDATE_IP" => {
            let entry = IpHistoryEntry::new(&req.service_name, &req.ip);
            store.append_ip(&entry)?;
            activity_log::record(
                store,
                LogEntry::notice(
                    "IP UPDATED",
                    format!(
                        "New IP {} logged for service {}",
                        req.ip, req.service_name
                    ),
                ),
            );
            retention::enforce_ip_history(store, state.config.retention.max_ips_per_service)?;
            Ok(ResponseEnvelope::new(
                200,
                format!("Logged new ip for service {}: {}", req.service_name, req.ip),
                json!("OK"),
            ))
        }
        "REQUEST_IP" => {
            let rows = store.read_ip_history()?;
            match ip_history::last_ip(&rows, &req.service_name) {
                Some(ip) => Ok(ResponseEnvelope::new(
                    200,
                    format!("Last known ip for service {}: {ip}", req.service_name),
                    json!(ip),
                )),
                None => Ok(ResponseEnvelope::new(
                    404,
                    format!("No known ip for service {}", req.service_name),
                    Value::Null,
                )),
            }
        }
        "REQUEST_NETWORK" => {
            let rows = store.read_ip_history()?;
            let network = ip_history::network_snapshot(&rows);
            Ok(ResponseEnvelope::new(200, "Current network", json!(network)))
        }
        other => {
            activity_log::record(
                store,
                LogEntry::notice(
                    "ERROR",
                    format!("[{trace_id}] could not understand request: {other}"),
                ),
            );
            Ok(ResponseEnvelope::new(
                400,
                format!("Unrecognized requestType: {other}"),
                Value::Null,
            ))
        }
    }
}

fn trim_activity_log(state: &AppState) -> RegistryResult<()> {
    let guard = state
        .store
        .lock()
        .map_err(|_| RegistryError::LockPoisoned)?;
    retention::enforce_activity_log(&*guard, state.config.retention.max_log_rows)
}

/// No-op read endpoint; only logs the probe.
async fn handle_get(Extension(state): Extension<Arc<AppState>>) -> &'static str {
    state.activity.notice("GET received", "placeholder endpoint");
    ""
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
