use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use ucfetcher::client::{CatalogService, VolumeListing};
use ucfetcher::config::ConnectorConfig;
use ucfetcher::error::{FetcherError, Result as FetcherResult};
use ucfetcher::models::{CatalogInfo, ColumnInfo, SchemaInfo, TableInfo, TableStub, VolumeInfo};
use ucfetcher::MetadataSynchronizer;
use ucstore::memory::MemoryDestination;
use ucstore::state::SyncState;

#[derive(Default)]
struct MockCatalogService {
    catalogs: Vec<CatalogInfo>,
    schemas: HashMap<String, Vec<SchemaInfo>>,
    schemas_fail: bool,
    tables: HashMap<String, Vec<TableStub>>,
    table_details: HashMap<String, TableInfo>,
    failing_tables: Vec<String>,
    volumes: HashMap<String, Vec<VolumeInfo>>,
    volumes_unsupported: bool,
    volumes_fail: bool,
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn list_catalogs(&self) -> FetcherResult<Vec<CatalogInfo>> {
        Ok(self.catalogs.clone())
    }

    async fn list_schemas(&self, catalog_name: &str) -> FetcherResult<Vec<SchemaInfo>> {
        if self.schemas_fail {
            return Err(FetcherError::Api {
                status: 503,
                message: "schema listing unavailable".to_string(),
            });
        }
        Ok(self.schemas.get(catalog_name).cloned().unwrap_or_default())
    }

    async fn list_tables(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> FetcherResult<Vec<TableStub>> {
        Ok(self
            .tables
            .get(&format!("{catalog_name}.{schema_name}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_table_metadata(&self, full_table_name: &str) -> FetcherResult<TableInfo> {
        if self.failing_tables.iter().any(|name| name == full_table_name) {
            return Err(FetcherError::Api {
                status: 500,
                message: "table metadata unavailable".to_string(),
            });
        }
        self.table_details
            .get(full_table_name)
            .cloned()
            .ok_or(FetcherError::Api {
                status: 404,
                message: format!("table {full_table_name} not found"),
            })
    }

    async fn list_volumes(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> FetcherResult<VolumeListing> {
        if self.volumes_fail {
            return Err(FetcherError::Api {
                status: 500,
                message: "volume listing unavailable".to_string(),
            });
        }
        if self.volumes_unsupported {
            return Ok(VolumeListing::Unsupported);
        }
        Ok(VolumeListing::Supported(
            self.volumes
                .get(&format!("{catalog_name}.{schema_name}"))
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

fn catalog(name: &str) -> CatalogInfo {
    CatalogInfo {
        name: name.to_string(),
        owner: Some("governance-team".to_string()),
        created_at: Some(1_700_000_000_000),
        updated_at: Some(1_700_000_000_000),
        ..Default::default()
    }
}

fn schema(name: &str) -> SchemaInfo {
    SchemaInfo {
        name: name.to_string(),
        owner: Some("governance-team".to_string()),
        ..Default::default()
    }
}

fn column(name: &str, type_text: &str) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        type_text: Some(type_text.to_string()),
        ..Default::default()
    }
}

fn table_details(columns: Vec<ColumnInfo>) -> TableInfo {
    TableInfo {
        table_type: Some("MANAGED".to_string()),
        data_source_format: Some("DELTA".to_string()),
        columns,
        ..Default::default()
    }
}

fn volume(name: &str) -> VolumeInfo {
    VolumeInfo {
        name: name.to_string(),
        volume_type: Some("EXTERNAL".to_string()),
        ..Default::default()
    }
}

/// One catalog `cat1` with schema `s1` holding table `t1` (two columns) and
/// volume `v1`.
fn sample_workspace() -> MockCatalogService {
    let mut service = MockCatalogService {
        catalogs: vec![catalog("cat1")],
        ..Default::default()
    };
    service
        .schemas
        .insert("cat1".to_string(), vec![schema("s1")]);
    service.tables.insert(
        "cat1.s1".to_string(),
        vec![TableStub {
            name: "t1".to_string(),
        }],
    );
    service.table_details.insert(
        "cat1.s1.t1".to_string(),
        table_details(vec![column("id", "bigint"), column("name", "string")]),
    );
    service
        .volumes
        .insert("cat1.s1".to_string(), vec![volume("v1")]);
    service
}

fn test_config() -> ConnectorConfig {
    ConnectorConfig::new("https://example.cloud.databricks.com", "test-token")
}

fn synchronizer(service: MockCatalogService, config: &ConnectorConfig) -> MetadataSynchronizer {
    MetadataSynchronizer::new(Arc::new(service), config)
}

fn field<'a>(record: &'a JsonValue, name: &str) -> &'a JsonValue {
    record.get(name).expect("record field present")
}

#[tokio::test]
async fn e2e_scenario_emits_expected_records() {
    let destination = MemoryDestination::new();
    let sync = synchronizer(sample_workspace(), &test_config());

    let report = sync
        .sync(&destination, SyncState::default())
        .await
        .expect("sync should succeed");

    assert_eq!(report.catalogs, 1);
    assert_eq!(report.schemas, 1);
    assert_eq!(report.tables, 1);
    assert_eq!(report.columns, 2);
    assert_eq!(report.volumes, 1);
    assert_eq!(report.tables_skipped, 0);

    assert_eq!(destination.record_count("catalogs"), 1);
    assert_eq!(destination.record_count("schemas"), 1);
    assert_eq!(destination.record_count("tables"), 1);
    assert_eq!(destination.record_count("columns"), 2);
    assert_eq!(destination.record_count("volumes"), 1);

    let tables = destination.records("tables");
    assert_eq!(field(&tables[0], "full_name"), "cat1.s1.t1");
    assert_eq!(field(&tables[0], "table_type"), "MANAGED");

    let columns = destination.records("columns");
    let positions: Vec<(String, i64)> = columns
        .iter()
        .map(|record| {
            (
                field(record, "column_name").as_str().unwrap().to_string(),
                field(record, "position").as_i64().unwrap(),
            )
        })
        .collect();
    assert!(positions.contains(&("id".to_string(), 0)));
    assert!(positions.contains(&("name".to_string(), 1)));

    let volumes = destination.records("volumes");
    assert_eq!(field(&volumes[0], "full_name"), "cat1.s1.v1");

    let checkpoints = destination.checkpoints();
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints[0].catalogs_synced, 1);
    assert_ne!(checkpoints[0].last_sync_time, SyncState::default().last_sync_time);
}

#[tokio::test]
async fn replaying_the_same_workspace_is_idempotent() {
    let destination = MemoryDestination::new();
    let config = test_config();

    let sync = synchronizer(sample_workspace(), &config);
    sync.sync(&destination, SyncState::default()).await.unwrap();

    let counts_after_first: Vec<usize> = ["catalogs", "schemas", "tables", "columns", "volumes"]
        .into_iter()
        .map(|table| destination.record_count(table))
        .collect();

    let sync = synchronizer(sample_workspace(), &config);
    sync.sync(&destination, SyncState::default()).await.unwrap();

    let counts_after_second: Vec<usize> = ["catalogs", "schemas", "tables", "columns", "volumes"]
        .into_iter()
        .map(|table| destination.record_count(table))
        .collect();

    assert_eq!(counts_after_first, counts_after_second);
    assert_eq!(counts_after_first, vec![1, 1, 1, 2, 1]);
}

#[tokio::test]
async fn failing_table_detail_is_isolated() {
    let mut service = sample_workspace();
    service.tables.get_mut("cat1.s1").unwrap().push(TableStub {
        name: "t_broken".to_string(),
    });
    service.failing_tables.push("cat1.s1.t_broken".to_string());

    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &test_config());
    let report = sync
        .sync(&destination, SyncState::default())
        .await
        .expect("sync should survive a failing table");

    assert_eq!(report.tables, 1);
    assert_eq!(report.tables_skipped, 1);

    // The sibling table, its parent schema and catalog are all present.
    assert_eq!(destination.record_count("catalogs"), 1);
    assert_eq!(destination.record_count("schemas"), 1);
    assert_eq!(destination.record_count("tables"), 1);

    // No column records leak out of the skipped table.
    for record in destination.records("columns") {
        assert_eq!(field(&record, "table_full_name"), "cat1.s1.t1");
    }
}

#[tokio::test]
async fn catalog_filter_limits_emission() {
    let mut service = MockCatalogService {
        catalogs: vec![catalog("a"), catalog("b"), catalog("c")],
        ..Default::default()
    };
    for name in ["a", "b", "c"] {
        service
            .schemas
            .insert(name.to_string(), vec![schema("s1")]);
    }

    let config = test_config().with_catalog_filter("a,b");
    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &config);
    let report = sync.sync(&destination, SyncState::default()).await.unwrap();

    assert_eq!(report.catalogs, 2);
    assert_eq!(destination.record_count("catalogs"), 2);
    for record in destination.records("catalogs") {
        assert_ne!(field(&record, "catalog_name"), "c");
    }
    for record in destination.records("schemas") {
        assert_ne!(field(&record, "catalog_name"), "c");
    }

    // One checkpoint per retained catalog, counter running across them.
    let checkpoints = destination.checkpoints();
    assert_eq!(checkpoints.len(), 2);
    assert_eq!(checkpoints[0].catalogs_synced, 1);
    assert_eq!(checkpoints[1].catalogs_synced, 2);
}

#[tokio::test]
async fn column_positions_fall_back_to_sequence_order() {
    let mut service = sample_workspace();
    // Names sort opposite to their sequence order on purpose.
    service.table_details.insert(
        "cat1.s1.t1".to_string(),
        table_details(vec![column("zeta", "string"), column("alpha", "string")]),
    );

    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &test_config());
    sync.sync(&destination, SyncState::default()).await.unwrap();

    let columns = destination.records("columns");
    let positions: HashMap<String, i64> = columns
        .iter()
        .map(|record| {
            (
                field(record, "column_name").as_str().unwrap().to_string(),
                field(record, "position").as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(positions["zeta"], 0);
    assert_eq!(positions["alpha"], 1);
}

#[tokio::test]
async fn unsupported_volumes_endpoint_is_not_an_error() {
    let mut service = sample_workspace();
    service.volumes_unsupported = true;

    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &test_config());
    let report = sync
        .sync(&destination, SyncState::default())
        .await
        .expect("sync should succeed without volume support");

    assert_eq!(report.volumes, 0);
    assert_eq!(destination.record_count("volumes"), 0);
    assert_eq!(destination.record_count("tables"), 1);
}

#[tokio::test]
async fn failing_volumes_listing_is_swallowed() {
    let mut service = sample_workspace();
    service.volumes_fail = true;

    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &test_config());
    let report = sync
        .sync(&destination, SyncState::default())
        .await
        .expect("volume failures never abort the sync");

    assert_eq!(report.volumes, 0);
    assert_eq!(destination.record_count("volumes"), 0);
}

#[tokio::test]
async fn schema_listing_failure_aborts_the_run() {
    let mut service = sample_workspace();
    service.schemas_fail = true;

    let destination = MemoryDestination::new();
    let sync = synchronizer(service, &test_config());
    let result = sync.sync(&destination, SyncState::default()).await;

    assert!(matches!(
        result,
        Err(FetcherError::Api { status: 503, .. })
    ));
    // No checkpoint is written for the catalog in flight.
    assert!(destination.checkpoints().is_empty());
}

#[tokio::test]
async fn state_counter_resets_per_run() {
    let destination = MemoryDestination::new();
    let config = test_config();

    let sync = synchronizer(sample_workspace(), &config);
    sync.sync(&destination, SyncState::default()).await.unwrap();
    let first = destination.last_checkpoint().unwrap();

    let sync = synchronizer(sample_workspace(), &config);
    sync.sync(&destination, first.clone()).await.unwrap();
    let second = destination.last_checkpoint().unwrap();

    // The counter reflects this run's progress, not a lifetime total.
    assert_eq!(first.catalogs_synced, 1);
    assert_eq!(second.catalogs_synced, 1);
}
