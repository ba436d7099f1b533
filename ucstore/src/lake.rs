//! Local JSONL lake destination.
//!
//! One file per destination table under `<base>/tables/`, merged by primary
//! key, plus `state.json` written at every checkpoint. This is the local-run
//! analog of a warehouse destination: replaying the same records yields the
//! same files.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use serde_json::Value as JsonValue;

use crate::config::StoreConfig;
use crate::destination::{join_key, Destination, UpsertOp};
use crate::errors::{Result, StoreError};
use crate::records::{declared_tables, TableDecl};
use crate::state::SyncState;

pub struct JsonlLake {
    config: StoreConfig,
    inner: Mutex<LakeInner>,
}

#[derive(Default)]
struct LakeInner {
    tables: HashMap<&'static str, BTreeMap<String, JsonValue>>,
    dirty: BTreeSet<&'static str>,
}

impl JsonlLake {
    pub async fn open(config: StoreConfig) -> Result<Self> {
        if config.tables_path.exists() && !config.tables_path.is_dir() {
            return Err(StoreError::Config(format!(
                "tables path {} exists and is not a directory",
                config.tables_path.display()
            )));
        }
        tokio::fs::create_dir_all(&config.tables_path).await?;
        Ok(Self {
            config,
            inner: Mutex::new(LakeInner::default()),
        })
    }

    /// State left behind by the previous run's last checkpoint, or the
    /// initial state when no checkpoint has ever been written.
    pub async fn load_state(&self) -> Result<SyncState> {
        match tokio::fs::read_to_string(&self.config.state_path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SyncState::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.config.tables_path.join(format!("{table}.jsonl"))
    }

    /// Loads existing rows for a table so this run's upserts merge with
    /// prior runs instead of replacing them.
    async fn ensure_loaded(&self, table: &'static str) -> Result<()> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.tables.contains_key(table) {
                return Ok(());
            }
        }

        let decl = declared_tables().into_iter().find(|d| d.table == table);
        let mut rows = BTreeMap::new();
        match tokio::fs::read_to_string(self.table_path(table)).await {
            Ok(contents) => {
                for line in contents.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value: JsonValue = serde_json::from_str(line)?;
                    let key = match &decl {
                        Some(decl) => row_key(decl, &value),
                        None => rows.len().to_string(),
                    };
                    rows.insert(key, value);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let mut inner = self.inner.lock().unwrap();
        inner.tables.entry(table).or_insert(rows);
        Ok(())
    }

    async fn write_table(&self, table: &str, rows: &BTreeMap<String, JsonValue>) -> Result<()> {
        let mut contents = String::new();
        for row in rows.values() {
            contents.push_str(&serde_json::to_string(row)?);
            contents.push('\n');
        }
        let path = self.table_path(table);
        let tmp = self.config.tables_path.join(format!("{table}.jsonl.tmp"));
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn row_key(decl: &TableDecl, row: &JsonValue) -> String {
    let parts: Vec<String> = decl
        .primary_key
        .iter()
        .map(|column| match row.get(*column) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect();
    join_key(parts.iter().map(String::as_str))
}

#[async_trait]
impl Destination for JsonlLake {
    async fn upsert(&self, op: UpsertOp) -> Result<()> {
        self.ensure_loaded(op.table).await?;
        let mut inner = self.inner.lock().unwrap();
        let key = op.key_string();
        inner.tables.entry(op.table).or_default().insert(key, op.data);
        inner.dirty.insert(op.table);
        Ok(())
    }

    async fn checkpoint(&self, state: &SyncState) -> Result<()> {
        let snapshot: Vec<(&'static str, BTreeMap<String, JsonValue>)> = {
            let inner = self.inner.lock().unwrap();
            inner
                .dirty
                .iter()
                .filter_map(|table| {
                    inner
                        .tables
                        .get(table)
                        .map(|rows| (*table, rows.clone()))
                })
                .collect()
        };

        for (table, rows) in &snapshot {
            self.write_table(table, rows).await?;
        }

        let contents = serde_json::to_string_pretty(state)?;
        let tmp = self.config.state_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.config.state_path).await?;

        let mut inner = self.inner.lock().unwrap();
        for (table, _) in &snapshot {
            inner.dirty.remove(table);
        }
        debug!(
            "Checkpoint written: {} tables flushed, {} catalogs synced",
            snapshot.len(),
            state.catalogs_synced
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CatalogRecord, Record};
    use tempfile::tempdir;

    fn sample_catalog(name: &str, owner: &str) -> CatalogRecord {
        CatalogRecord {
            catalog_name: name.to_string(),
            catalog_type: "MANAGED_CATALOG".to_string(),
            comment: None,
            owner: Some(owner.to_string()),
            created_at: "1970-01-01T00:00:00Z".to_string(),
            created_by: None,
            updated_at: "1970-01-01T00:00:00Z".to_string(),
            updated_by: None,
            metastore_id: None,
        }
    }

    #[tokio::test]
    async fn load_state_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let lake = JsonlLake::open(StoreConfig::new(dir.path())).await.unwrap();
        let state = lake.load_state().await.unwrap();
        assert_eq!(state, SyncState::default());
    }

    #[tokio::test]
    async fn checkpoint_persists_state_and_rows() {
        let dir = tempdir().unwrap();
        let lake = JsonlLake::open(StoreConfig::new(dir.path())).await.unwrap();

        let op = UpsertOp::from_record(&sample_catalog("cat1", "alice")).unwrap();
        lake.upsert(op).await.unwrap();

        let state = SyncState {
            last_sync_time: "2024-06-01T12:00:00Z".to_string(),
            catalogs_synced: 1,
        };
        lake.checkpoint(&state).await.unwrap();

        let reopened = JsonlLake::open(StoreConfig::new(dir.path())).await.unwrap();
        assert_eq!(reopened.load_state().await.unwrap(), state);

        let contents =
            std::fs::read_to_string(dir.path().join("tables").join("catalogs.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn upserts_merge_with_rows_from_prior_runs() {
        let dir = tempdir().unwrap();

        let lake = JsonlLake::open(StoreConfig::new(dir.path())).await.unwrap();
        let op = UpsertOp::from_record(&sample_catalog("cat1", "alice")).unwrap();
        lake.upsert(op).await.unwrap();
        lake.checkpoint(&SyncState::default()).await.unwrap();
        drop(lake);

        // A second run replays cat1 with new fields and adds cat2.
        let lake = JsonlLake::open(StoreConfig::new(dir.path())).await.unwrap();
        let op = UpsertOp::from_record(&sample_catalog("cat1", "bob")).unwrap();
        lake.upsert(op).await.unwrap();
        let op = UpsertOp::from_record(&sample_catalog("cat2", "carol")).unwrap();
        lake.upsert(op).await.unwrap();
        lake.checkpoint(&SyncState::default()).await.unwrap();

        let contents =
            std::fs::read_to_string(dir.path().join("tables").join("catalogs.jsonl")).unwrap();
        let rows: Vec<JsonValue> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        let cat1 = rows
            .iter()
            .find(|row| row["catalog_name"] == "cat1")
            .unwrap();
        assert_eq!(cat1["owner"], "bob");
    }
}
