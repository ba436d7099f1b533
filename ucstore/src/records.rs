//! Normalized destination records for the five metadata tables.
//!
//! Each record type carries its table name, primary-key columns, and a typed
//! column declaration so a destination can create matching tables before the
//! first upsert arrives.

use serde::{Deserialize, Serialize};

/// Column types understood by the destination schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    String,
    Int,
    Boolean,
    UtcDatetime,
}

/// One column of a declared destination table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDecl {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Declared shape of one destination table.
#[derive(Debug, Clone, Serialize)]
pub struct TableDecl {
    pub table: &'static str,
    pub primary_key: Vec<&'static str>,
    pub columns: Vec<ColumnDecl>,
}

fn col(name: &'static str, column_type: ColumnType) -> ColumnDecl {
    ColumnDecl { name, column_type }
}

/// A type that maps onto one destination table row.
pub trait Record: Serialize + Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn primary_keys() -> Vec<&'static str>;

    /// Values of the primary-key columns, in declaration order.
    fn key(&self) -> Vec<String>;

    fn decl() -> TableDecl;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub catalog_name: String,
    pub catalog_type: String,
    pub comment: Option<String>,
    pub owner: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
    pub metastore_id: Option<String>,
}

impl Record for CatalogRecord {
    const TABLE: &'static str = "catalogs";

    fn primary_keys() -> Vec<&'static str> {
        vec!["catalog_name"]
    }

    fn key(&self) -> Vec<String> {
        vec![self.catalog_name.clone()]
    }

    fn decl() -> TableDecl {
        TableDecl {
            table: Self::TABLE,
            primary_key: Self::primary_keys(),
            columns: vec![
                col("catalog_name", ColumnType::String),
                col("catalog_type", ColumnType::String),
                col("comment", ColumnType::String),
                col("owner", ColumnType::String),
                col("created_at", ColumnType::UtcDatetime),
                col("created_by", ColumnType::String),
                col("updated_at", ColumnType::UtcDatetime),
                col("updated_by", ColumnType::String),
                col("metastore_id", ColumnType::String),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub full_name: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub comment: Option<String>,
    pub owner: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
}

impl Record for SchemaRecord {
    const TABLE: &'static str = "schemas";

    fn primary_keys() -> Vec<&'static str> {
        vec!["full_name"]
    }

    fn key(&self) -> Vec<String> {
        vec![self.full_name.clone()]
    }

    fn decl() -> TableDecl {
        TableDecl {
            table: Self::TABLE,
            primary_key: Self::primary_keys(),
            columns: vec![
                col("full_name", ColumnType::String),
                col("catalog_name", ColumnType::String),
                col("schema_name", ColumnType::String),
                col("comment", ColumnType::String),
                col("owner", ColumnType::String),
                col("created_at", ColumnType::UtcDatetime),
                col("created_by", ColumnType::String),
                col("updated_at", ColumnType::UtcDatetime),
                col("updated_by", ColumnType::String),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub full_name: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub table_type: Option<String>,
    pub data_source_format: Option<String>,
    pub storage_location: Option<String>,
    pub comment: Option<String>,
    pub owner: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
}

impl Record for TableRecord {
    const TABLE: &'static str = "tables";

    fn primary_keys() -> Vec<&'static str> {
        vec!["full_name"]
    }

    fn key(&self) -> Vec<String> {
        vec![self.full_name.clone()]
    }

    fn decl() -> TableDecl {
        TableDecl {
            table: Self::TABLE,
            primary_key: Self::primary_keys(),
            columns: vec![
                col("full_name", ColumnType::String),
                col("catalog_name", ColumnType::String),
                col("schema_name", ColumnType::String),
                col("table_name", ColumnType::String),
                col("table_type", ColumnType::String),
                col("data_source_format", ColumnType::String),
                col("storage_location", ColumnType::String),
                col("comment", ColumnType::String),
                col("owner", ColumnType::String),
                col("created_at", ColumnType::UtcDatetime),
                col("created_by", ColumnType::String),
                col("updated_at", ColumnType::UtcDatetime),
                col("updated_by", ColumnType::String),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub table_full_name: String,
    pub column_name: String,
    pub position: i64,
    pub data_type: Option<String>,
    pub nullable: bool,
    pub comment: Option<String>,
    pub partition_index: Option<i64>,
}

impl Record for ColumnRecord {
    const TABLE: &'static str = "columns";

    fn primary_keys() -> Vec<&'static str> {
        vec!["table_full_name", "column_name"]
    }

    fn key(&self) -> Vec<String> {
        vec![self.table_full_name.clone(), self.column_name.clone()]
    }

    fn decl() -> TableDecl {
        TableDecl {
            table: Self::TABLE,
            primary_key: Self::primary_keys(),
            columns: vec![
                col("table_full_name", ColumnType::String),
                col("column_name", ColumnType::String),
                col("position", ColumnType::Int),
                col("data_type", ColumnType::String),
                col("nullable", ColumnType::Boolean),
                col("comment", ColumnType::String),
                col("partition_index", ColumnType::Int),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub full_name: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub volume_name: String,
    pub volume_type: Option<String>,
    pub storage_location: Option<String>,
    pub comment: Option<String>,
    pub owner: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
}

impl Record for VolumeRecord {
    const TABLE: &'static str = "volumes";

    fn primary_keys() -> Vec<&'static str> {
        vec!["full_name"]
    }

    fn key(&self) -> Vec<String> {
        vec![self.full_name.clone()]
    }

    fn decl() -> TableDecl {
        TableDecl {
            table: Self::TABLE,
            primary_key: Self::primary_keys(),
            columns: vec![
                col("full_name", ColumnType::String),
                col("catalog_name", ColumnType::String),
                col("schema_name", ColumnType::String),
                col("volume_name", ColumnType::String),
                col("volume_type", ColumnType::String),
                col("storage_location", ColumnType::String),
                col("comment", ColumnType::String),
                col("owner", ColumnType::String),
                col("created_at", ColumnType::UtcDatetime),
                col("created_by", ColumnType::String),
                col("updated_at", ColumnType::UtcDatetime),
                col("updated_by", ColumnType::String),
            ],
        }
    }
}

/// The full destination schema, one declaration per table.
pub fn declared_tables() -> Vec<TableDecl> {
    vec![
        CatalogRecord::decl(),
        SchemaRecord::decl(),
        TableRecord::decl(),
        ColumnRecord::decl(),
        VolumeRecord::decl(),
    ]
}
