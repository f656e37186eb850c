//! Retention manager: keeps both tables bounded.
//!
//! IP history is capped per service: walk the table newest to oldest with a
//! per-service counter, keep rows until that service hits its cap, then
//! restore chronological order and rewrite the whole table in one pass
//! (batch read, in-memory filter, single bulk write). The activity log is
//! capped in total by deleting the oldest excess rows directly.

use std::collections::HashMap;

use crate::errors::RegistryResult;
use crate::ip_history::IpHistoryEntry;
use crate::store::RegistryStore;

/// Discard the oldest IP-history rows exceeding `max_per_service`,
/// independently for each service.
pub fn enforce_ip_history(
    store: &dyn RegistryStore,
    max_per_service: usize,
) -> RegistryResult<()> {
    let rows = store.read_ip_history()?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<IpHistoryEntry> = Vec::with_capacity(rows.len());
    for row in rows.iter().rev() {
        let count = seen.entry(row.service_name.clone()).or_insert(0);
        if *count >= max_per_service {
            continue;
        }
        *count += 1;
        kept.push(row.clone());
    }

    if kept.len() == rows.len() {
        // Nothing evicted; skip the rewrite.
        return Ok(());
    }

    // The keep-walk ran newest-first; restore chronological order.
    kept.reverse();
    store.rewrite_ip_history(&kept)
}

/// Delete the oldest log rows until at most `max_rows` remain.
pub fn enforce_activity_log(store: &dyn RegistryStore, max_rows: usize) -> RegistryResult<()> {
    let count = store.log_row_count()?;
    if count > max_rows {
        store.delete_log_prefix(count - max_rows)?;
    }
    Ok(())
}
