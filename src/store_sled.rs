//! Sled-backed implementation of the registry store.
//!
//! Each table is a sled tree. Append order is materialized as monotonically
//! increasing big-endian u64 keys, so iterating a tree yields rows in their
//! original insertion order; values are JSON-encoded rows.

use sled::{Db, Tree};

use crate::activity_log::LogEntry;
use crate::errors::{RegistryError, RegistryResult};
use crate::ip_history::IpHistoryEntry;
use crate::store::RegistryStore;

const IP_HISTORY_TREE: &str = "ip_history";
const ACTIVITY_LOG_TREE: &str = "activity_log";

pub struct SledRegistryStore {
    db: Db,
}

impl SledRegistryStore {
    /// Opens (or creates) the database under `path`.
    pub fn new(path: &str) -> RegistryResult<Self> {
        let db = sled::open(path)
            .map_err(|e| RegistryError::store(format!("open db at {path}"), e))?;
        Ok(SledRegistryStore { db })
    }

    fn tree(&self, name: &str) -> RegistryResult<Tree> {
        self.db
            .open_tree(name)
            .map_err(|e| RegistryError::store(format!("open tree {name}"), e))
    }

    /// Key that sorts after every existing row in `tree`.
    fn next_key(tree: &Tree) -> RegistryResult<[u8; 8]> {
        let next = match tree.last()? {
            Some((key, _)) => {
                let bytes: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| RegistryError::internal("malformed row key"))?;
                u64::from_be_bytes(bytes) + 1
            }
            None => 0,
        };
        Ok(next.to_be_bytes())
    }

    fn append<T: serde::Serialize>(&self, tree_name: &str, row: &T) -> RegistryResult<()> {
        let tree = self.tree(tree_name)?;
        let key = Self::next_key(&tree)?;
        let bytes = serde_json::to_vec(row)
            .map_err(|e| RegistryError::serialization(format!("{tree_name} row"), e))?;
        tree.insert(key, bytes)?;
        tree.flush()?;
        Ok(())
    }

    fn read_all<T: serde::de::DeserializeOwned>(&self, tree_name: &str) -> RegistryResult<Vec<T>> {
        let tree = self.tree(tree_name)?;
        let mut rows = Vec::with_capacity(tree.len());
        for item in tree.iter() {
            let (_, value) = item?;
            let row = serde_json::from_slice(&value)
                .map_err(|e| RegistryError::serialization(format!("{tree_name} row"), e))?;
            rows.push(row);
        }
        Ok(rows)
    }
}

impl RegistryStore for SledRegistryStore {
    fn append_ip(&self, entry: &IpHistoryEntry) -> RegistryResult<()> {
        self.append(IP_HISTORY_TREE, entry)
    }

    fn read_ip_history(&self) -> RegistryResult<Vec<IpHistoryEntry>> {
        self.read_all(IP_HISTORY_TREE)
    }

    fn rewrite_ip_history(&self, rows: &[IpHistoryEntry]) -> RegistryResult<()> {
        let tree = self.tree(IP_HISTORY_TREE)?;
        tree.clear()?;
        for (i, row) in rows.iter().enumerate() {
            let bytes = serde_json::to_vec(row)
                .map_err(|e| RegistryError::serialization("ip history row", e))?;
            tree.insert((i as u64).to_be_bytes(), bytes)?;
        }
        tree.flush()?;
        Ok(())
    }

    fn append_log(&self, entry: &LogEntry) -> RegistryResult<()> {
        self.append(ACTIVITY_LOG_TREE, entry)
    }

    fn read_activity_log(&self) -> RegistryResult<Vec<LogEntry>> {
        self.read_all(ACTIVITY_LOG_TREE)
    }

    fn log_row_count(&self) -> RegistryResult<usize> {
        Ok(self.tree(ACTIVITY_LOG_TREE)?.len())
    }

    fn delete_log_prefix(&self, n: usize) -> RegistryResult<()> {
        let tree = self.tree(ACTIVITY_LOG_TREE)?;
        let keys: Vec<_> = tree
            .iter()
            .keys()
            .take(n)
            .collect::<Result<Vec<_>, _>>()?;
        for key in keys {
            tree.remove(key)?;
        }
        tree.flush()?;
        Ok(())
    }
}
