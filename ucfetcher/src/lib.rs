pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod sync;

pub use crate::client::{CatalogService, UnityCatalogClient, VolumeListing};
pub use crate::config::ConnectorConfig;
pub use crate::error::{FetcherError, Result};
pub use crate::sync::{MetadataSynchronizer, SyncReport};
