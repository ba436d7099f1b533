use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::destination::{Destination, UpsertOp};
use crate::errors::Result;
use crate::state::SyncState;

/// In-process destination used by tests and dry runs.
///
/// Records are held per table in key order; checkpoints are appended so a
/// caller can inspect the full checkpoint history of a run.
#[derive(Default)]
pub struct MemoryDestination {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tables: HashMap<&'static str, BTreeMap<String, JsonValue>>,
    checkpoints: Vec<SyncState>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final record set for a table, in key order.
    pub fn records(&self, table: &str) -> Vec<JsonValue> {
        let inner = self.inner.lock().unwrap();
        inner
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record_count(&self, table: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.tables.get(table).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn checkpoints(&self) -> Vec<SyncState> {
        self.inner.lock().unwrap().checkpoints.clone()
    }

    pub fn last_checkpoint(&self) -> Option<SyncState> {
        self.inner.lock().unwrap().checkpoints.last().cloned()
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn upsert(&self, op: UpsertOp) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .tables
            .entry(op.table)
            .or_default()
            .insert(op.key_string(), op.data);
        Ok(())
    }

    async fn checkpoint(&self, state: &SyncState) -> Result<()> {
        self.inner.lock().unwrap().checkpoints.push(state.clone());
        Ok(())
    }
}
