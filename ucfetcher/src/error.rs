use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("missing required configuration field: {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Unity Catalog API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("destination error: {0}")]
    Store(#[from] ucstore::StoreError),
}

pub type Result<T> = std::result::Result<T, FetcherError>;
