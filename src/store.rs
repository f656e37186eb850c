//! Persistence abstraction over the two registry tables.
//!
//! The store owns the Log and IP-History tables exclusively; every mutation
//! goes through append or bulk-rewrite operations. Implementations are
//! injected behind this trait so handlers and tests never depend on a
//! concrete backend.

use crate::activity_log::LogEntry;
use crate::errors::RegistryResult;
use crate::ip_history::IpHistoryEntry;

pub trait RegistryStore: Send + Sync {
    /// Append one row to the IP-History table.
    fn append_ip(&self, entry: &IpHistoryEntry) -> RegistryResult<()>;

    /// All IP-History rows in original append order.
    fn read_ip_history(&self) -> RegistryResult<Vec<IpHistoryEntry>>;

    /// Clear the IP-History table and write `rows` in order.
    fn rewrite_ip_history(&self, rows: &[IpHistoryEntry]) -> RegistryResult<()>;

    /// Append one row to the Log table.
    fn append_log(&self, entry: &LogEntry) -> RegistryResult<()>;

    /// All Log rows in original append order.
    fn read_activity_log(&self) -> RegistryResult<Vec<LogEntry>>;

    /// Number of rows currently in the Log table.
    fn log_row_count(&self) -> RegistryResult<usize>;

    /// Remove the `n` oldest Log rows.
    fn delete_log_prefix(&self, n: usize) -> RegistryResult<()>;
}
