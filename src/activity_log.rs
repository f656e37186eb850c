//! Persistent activity log for the registry.
//!
//! Every inbound request, authorization decision, and outgoing response is
//! appended to the Log table for diagnostics. Rows are append-only; the
//! retention manager trims the oldest rows once the table exceeds its cap.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::RegistryStore;

/// One row of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Epoch milliseconds at creation time.
    pub timestamp: i64,
    /// Human-readable timestamp, for eyeballing the table.
    pub human_timestamp: String,
    pub event_name: String,
    pub message: String,
}

impl LogEntry {
    /// A plain notice row.
    pub fn notice(event_name: &str, message: impl Into<String>) -> Self {
        let now = Utc::now();
        LogEntry {
            timestamp: now.timestamp_millis(),
            human_timestamp: now.to_rfc2822(),
            event_name: event_name.to_string(),
            message: message.into(),
        }
    }

    /// A row whose message is a serialized payload (request bodies,
    /// response envelopes).
    pub fn payload<T: Serialize>(event_name: &str, payload: &T) -> Self {
        let message = serde_json::to_string(payload)
            .unwrap_or_else(|e| format!("<unserializable payload: {e}>"));
        Self::notice(event_name, message)
    }
}

/// Append one entry through an already-held store handle.
///
/// Logging must never fail a request: append errors are reported on the
/// tracing side and otherwise swallowed.
pub fn record(store: &dyn RegistryStore, entry: LogEntry) {
    if let Err(e) = store.append_log(&entry) {
        tracing::warn!(event = %entry.event_name, "activity log append failed: {e}");
    }
}

/// Recorder handle over the shared store, for use outside locked regions.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<Mutex<dyn RegistryStore>>,
}

impl ActivityLog {
    pub fn new(store: Arc<Mutex<dyn RegistryStore>>) -> Self {
        ActivityLog { store }
    }

    pub fn record(&self, entry: LogEntry) {
        let guard = match self.store.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("activity log skipped: store lock poisoned");
                return;
            }
        };
        record(&*guard, entry);
    }

    pub fn notice(&self, event_name: &str, message: impl Into<String>) {
        self.record(LogEntry::notice(event_name, message));
    }

    pub fn payload<T: Serialize>(&self, event_name: &str, payload: &T) {
        self.record(LogEntry::payload(event_name, payload));
    }
}
