use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::errors::Result;
use crate::records::Record;
use crate::state::SyncState;

/// Composite-key join separator; never appears in catalog object names.
const KEY_SEPARATOR: char = '\u{1f}';

/// A single insert-or-update operation keyed by natural primary key.
#[derive(Debug, Clone)]
pub struct UpsertOp {
    pub table: &'static str,
    pub key: Vec<String>,
    pub data: JsonValue,
}

impl UpsertOp {
    pub fn from_record<R: Record>(record: &R) -> Result<Self> {
        Ok(Self {
            table: R::TABLE,
            key: record.key(),
            data: serde_json::to_value(record)?,
        })
    }

    /// Primary-key values joined into a single lookup key.
    pub fn key_string(&self) -> String {
        join_key(self.key.iter().map(String::as_str))
    }
}

pub(crate) fn join_key<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(&KEY_SEPARATOR.to_string())
}

/// The delivery boundary of the sync connector.
///
/// Implementations must provide idempotent upsert-by-primary-key semantics:
/// replaying an operation with the same key overwrites prior fields instead
/// of producing a second row.
#[async_trait]
pub trait Destination: Send + Sync {
    async fn upsert(&self, op: UpsertOp) -> Result<()>;

    /// Durably records sync progress; called after each completed catalog.
    async fn checkpoint(&self, state: &SyncState) -> Result<()>;
}
