use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FetcherError, Result};

/// Connection settings for one sync run.
///
/// Mirrors the connector's mapping wire format: `workspace_url` and
/// `access_token` are required, `catalog_filter` is an optional
/// comma-separated allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub workspace_url: String,
    pub access_token: String,
    #[serde(default)]
    pub catalog_filter: Option<String>,
}

impl ConnectorConfig {
    pub fn new(workspace_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            workspace_url: workspace_url.into(),
            access_token: access_token.into(),
            catalog_filter: None,
        }
    }

    pub fn with_catalog_filter(mut self, filter: impl Into<String>) -> Self {
        self.catalog_filter = Some(filter.into());
        self
    }

    /// Builds a validated config from the mapping wire format.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let workspace_url = map
            .get("workspace_url")
            .cloned()
            .ok_or(FetcherError::MissingConfig("workspace_url"))?;
        let access_token = map
            .get("access_token")
            .cloned()
            .ok_or(FetcherError::MissingConfig("access_token"))?;
        let config = Self {
            workspace_url,
            access_token,
            catalog_filter: map.get("catalog_filter").cloned(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checked before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.workspace_url.trim().is_empty() {
            return Err(FetcherError::MissingConfig("workspace_url"));
        }
        if self.access_token.trim().is_empty() {
            return Err(FetcherError::MissingConfig("access_token"));
        }
        Url::parse(&self.workspace_url).map_err(|err| {
            FetcherError::InvalidConfig(format!("workspace_url is not a valid URL: {err}"))
        })?;
        Ok(())
    }

    /// Catalog allow-list parsed from the comma-separated filter.
    ///
    /// `None` means no filtering was requested; an all-whitespace or empty
    /// filter string is treated the same way.
    pub fn catalog_allow_list(&self) -> Option<BTreeSet<String>> {
        let raw = self.catalog_filter.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let set: BTreeSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if set.is_empty() {
            None
        } else {
            Some(set)
        }
    }
}
