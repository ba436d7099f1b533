use serde::{Deserialize, Serialize};

/// Value of `last_sync_time` before the first run ever completes a catalog.
pub const INITIAL_SYNC_TIME: &str = "1990-01-01T00:00:00Z";

/// Cursor carried between runs, checkpointed after each completed catalog.
///
/// `last_sync_time` is recorded for every checkpoint but is advisory: the
/// remote listing endpoints return full results, so each run re-walks the
/// hierarchy rather than filtering by this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    pub last_sync_time: String,
    pub catalogs_synced: u64,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_sync_time: INITIAL_SYNC_TIME.to_string(),
            catalogs_synced: 0,
        }
    }
}
