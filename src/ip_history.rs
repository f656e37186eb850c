//! IP-history rows and the scans performed over them.
//!
//! A service exists only as the set of rows carrying its name; the most
//! recently appended row with a non-empty ip is that service's current
//! known address.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One observation: at `timestamp`, `service_name` reported `ip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpHistoryEntry {
    /// Epoch milliseconds at append time.
    pub timestamp: i64,
    pub service_name: String,
    /// May be empty; empty rows never win a snapshot.
    pub ip: String,
}

impl IpHistoryEntry {
    pub fn new(service_name: &str, ip: &str) -> Self {
        IpHistoryEntry {
            timestamp: Utc::now().timestamp_millis(),
            service_name: service_name.to_string(),
            ip: ip.to_string(),
        }
    }
}

/// The ip of the most recently appended row for `service_name`, or None if
/// the service has no history at all. The last row wins even when its ip is
/// empty.
pub fn last_ip<'a>(rows: &'a [IpHistoryEntry], service_name: &str) -> Option<&'a str> {
    rows.iter()
        .rev()
        .find(|row| row.service_name == service_name)
        .map(|row| row.ip.as_str())
}

/// Latest non-empty ip per service, most-recently-active service first.
///
/// Walks the table newest to oldest and records each service the first time
/// it is seen with a non-empty ip; older rows for that service are ignored.
/// Services whose rows all carry empty ips are omitted.
pub fn network_snapshot(rows: &[IpHistoryEntry]) -> Vec<(String, String)> {
    let mut seen: Vec<(String, String)> = Vec::new();
    for row in rows.iter().rev() {
        if row.ip.is_empty() {
            continue;
        }
        if seen.iter().any(|(name, _)| name == &row.service_name) {
            continue;
        }
        seen.push((row.service_name.clone(), row.ip.clone()));
    }
    seen
}
