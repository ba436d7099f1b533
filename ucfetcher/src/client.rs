use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use serde::de::DeserializeOwned;

use crate::config::ConnectorConfig;
use crate::error::{FetcherError, Result};
use crate::models::{
    CatalogInfo, ListCatalogsResponse, ListSchemasResponse, ListTablesResponse,
    ListVolumesResponse, SchemaInfo, TableInfo, TableStub, VolumeInfo,
};

pub const API_VERSION: &str = "2.1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const RETRY_MIN_DELAY: Duration = Duration::from_millis(100);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Result of probing the volumes endpoint for one schema.
///
/// Volumes are not available in every workspace; a missing endpoint is a
/// capability statement, not a failure.
#[derive(Debug, Clone)]
pub enum VolumeListing {
    Supported(Vec<VolumeInfo>),
    Unsupported,
}

/// Listing and detail-fetch operations against a Unity Catalog workspace.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_catalogs(&self) -> Result<Vec<CatalogInfo>>;
    async fn list_schemas(&self, catalog_name: &str) -> Result<Vec<SchemaInfo>>;
    async fn list_tables(&self, catalog_name: &str, schema_name: &str)
        -> Result<Vec<TableStub>>;
    async fn get_table_metadata(&self, full_table_name: &str) -> Result<TableInfo>;
    async fn list_volumes(&self, catalog_name: &str, schema_name: &str)
        -> Result<VolumeListing>;
}

/// HTTP client for the Unity Catalog REST API with bearer auth and
/// retry-with-backoff on transient failures.
pub struct UnityCatalogClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl UnityCatalogClient {
    pub fn new(config: &ConnectorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", config.access_token)).map_err(|_| {
                FetcherError::InvalidConfig(
                    "access_token contains characters not allowed in a header".to_string(),
                )
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(RETRY_MIN_DELAY, RETRY_MAX_DELAY)
            .build_with_max_retries(MAX_RETRIES);
        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                TransientStatusStrategy,
            ))
            .build();

        Ok(Self {
            http,
            base_url: base_url(&config.workspace_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {url}");
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetcherError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

fn base_url(workspace_url: &str) -> String {
    format!(
        "{}/api/{}/unity-catalog",
        workspace_url.trim_end_matches('/'),
        API_VERSION
    )
}

#[async_trait]
impl CatalogService for UnityCatalogClient {
    async fn list_catalogs(&self) -> Result<Vec<CatalogInfo>> {
        info!("Fetching catalogs from Unity Catalog");
        let response: ListCatalogsResponse = self.get("catalogs", &[]).await?;
        Ok(response.catalogs)
    }

    async fn list_schemas(&self, catalog_name: &str) -> Result<Vec<SchemaInfo>> {
        debug!("Fetching schemas for catalog: {catalog_name}");
        let response: ListSchemasResponse = self
            .get("schemas", &[("catalog_name", catalog_name)])
            .await?;
        Ok(response.schemas)
    }

    async fn list_tables(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> Result<Vec<TableStub>> {
        debug!("Fetching tables for {catalog_name}.{schema_name}");
        let response: ListTablesResponse = self
            .get(
                "tables",
                &[("catalog_name", catalog_name), ("schema_name", schema_name)],
            )
            .await?;
        Ok(response.tables)
    }

    async fn get_table_metadata(&self, full_table_name: &str) -> Result<TableInfo> {
        debug!("Fetching metadata for table: {full_table_name}");
        self.get(&format!("tables/{full_table_name}"), &[]).await
    }

    async fn list_volumes(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> Result<VolumeListing> {
        debug!("Fetching volumes for {catalog_name}.{schema_name}");
        let result = self
            .get::<ListVolumesResponse>(
                "volumes",
                &[("catalog_name", catalog_name), ("schema_name", schema_name)],
            )
            .await;
        match result {
            Ok(response) => Ok(VolumeListing::Supported(response.volumes)),
            Err(FetcherError::Api { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(VolumeListing::Unsupported)
            }
            Err(err) => Err(err),
        }
    }
}

/// Retries timeouts, connection failures, 5xx, and 429; everything else is
/// surfaced immediately.
struct TransientStatusStrategy;

impl RetryableStrategy for TransientStatusStrategy {
    fn handle(&self, res: &reqwest_middleware::Result<reqwest::Response>) -> Option<Retryable> {
        match res {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Some(Retryable::Transient)
                } else if status.is_success() {
                    None
                } else {
                    Some(Retryable::Fatal)
                }
            }
            Err(error) => reqwest_retry::default_on_request_failure(error),
        }
    }
}
