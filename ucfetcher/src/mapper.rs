//! Pure conversion from raw API objects to normalized destination records.
//!
//! Given the same input object and parent keys these functions always
//! produce the same record; missing optional fields map to `None` or a
//! documented default, never to an error.

use chrono::{DateTime, Utc};

use ucstore::records::{CatalogRecord, ColumnRecord, SchemaRecord, TableRecord, VolumeRecord};

use crate::models::{CatalogInfo, ColumnInfo, SchemaInfo, TableInfo, VolumeInfo};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DEFAULT_CATALOG_TYPE: &str = "MANAGED_CATALOG";

pub(crate) fn format_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats a source epoch-millisecond timestamp as UTC ISO-8601.
///
/// Absent or unrepresentable values clamp to the epoch rather than fail.
pub fn format_epoch_millis(millis: Option<i64>) -> String {
    let secs = millis.unwrap_or(0) / 1000;
    let timestamp =
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    format_utc(timestamp)
}

pub fn map_catalog(catalog: &CatalogInfo) -> CatalogRecord {
    CatalogRecord {
        catalog_name: catalog.name.clone(),
        catalog_type: catalog
            .catalog_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CATALOG_TYPE.to_string()),
        comment: catalog.comment.clone(),
        owner: catalog.owner.clone(),
        created_at: format_epoch_millis(catalog.created_at),
        created_by: catalog.created_by.clone(),
        updated_at: format_epoch_millis(catalog.updated_at),
        updated_by: catalog.updated_by.clone(),
        metastore_id: catalog.metastore_id.clone(),
    }
}

pub fn map_schema(catalog_name: &str, schema: &SchemaInfo) -> SchemaRecord {
    SchemaRecord {
        full_name: format!("{catalog_name}.{}", schema.name),
        catalog_name: catalog_name.to_string(),
        schema_name: schema.name.clone(),
        comment: schema.comment.clone(),
        owner: schema.owner.clone(),
        created_at: format_epoch_millis(schema.created_at),
        created_by: schema.created_by.clone(),
        updated_at: format_epoch_millis(schema.updated_at),
        updated_by: schema.updated_by.clone(),
    }
}

pub fn map_table(
    catalog_name: &str,
    schema_name: &str,
    table_name: &str,
    details: &TableInfo,
) -> TableRecord {
    TableRecord {
        full_name: format!("{catalog_name}.{schema_name}.{table_name}"),
        catalog_name: catalog_name.to_string(),
        schema_name: schema_name.to_string(),
        table_name: table_name.to_string(),
        table_type: details.table_type.clone(),
        data_source_format: details.data_source_format.clone(),
        storage_location: details.storage_location.clone(),
        comment: details.comment.clone(),
        owner: details.owner.clone(),
        created_at: format_epoch_millis(details.created_at),
        created_by: details.created_by.clone(),
        updated_at: format_epoch_millis(details.updated_at),
        updated_by: details.updated_by.clone(),
    }
}

/// `index` is the column's zero-based position in the source sequence, used
/// when the source omits an explicit ordinal.
pub fn map_column(table_full_name: &str, index: usize, column: &ColumnInfo) -> ColumnRecord {
    ColumnRecord {
        table_full_name: table_full_name.to_string(),
        column_name: column.name.clone(),
        position: column.position.unwrap_or(index as i64),
        data_type: column.type_text.clone().or_else(|| column.type_name.clone()),
        nullable: column.nullable.unwrap_or(true),
        comment: column.comment.clone(),
        partition_index: column.partition_index,
    }
}

pub fn map_volume(catalog_name: &str, schema_name: &str, volume: &VolumeInfo) -> VolumeRecord {
    VolumeRecord {
        full_name: format!("{catalog_name}.{schema_name}.{}", volume.name),
        catalog_name: catalog_name.to_string(),
        schema_name: schema_name.to_string(),
        volume_name: volume.name.clone(),
        volume_type: volume.volume_type.clone(),
        storage_location: volume.storage_location.clone(),
        comment: volume.comment.clone(),
        owner: volume.owner.clone(),
        created_at: format_epoch_millis(volume.created_at),
        created_by: volume.created_by.clone(),
        updated_at: format_epoch_millis(volume.updated_at),
        updated_by: volume.updated_by.clone(),
    }
}
