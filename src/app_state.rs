use std::sync::{Arc, Mutex};

use crate::activity_log::ActivityLog;
use crate::config_loader::RegistryConfig;
use crate::store::RegistryStore;

/// Shared context handed to every request handler: the immutable config,
/// the store handle, and the activity-log recorder over the same store.
///
/// The mutex gives per-store mutual exclusion so two handlers cannot
/// interleave the retention read-modify-write.
pub struct AppState {
    pub config: RegistryConfig,
    pub store: Arc<Mutex<dyn RegistryStore>>,
    pub activity: ActivityLog,
}

impl AppState {
    pub fn new(config: RegistryConfig, store: Arc<Mutex<dyn RegistryStore>>) -> Self {
        let activity = ActivityLog::new(Arc::clone(&store));
        AppState {
            config,
            store,
            activity,
        }
    }
}
