use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct StoreConfig {
    pub tables_path: PathBuf,
    pub state_path: PathBuf,
}

impl StoreConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            tables_path: base_path.join("tables"),
            state_path: base_path.join("state.json"),
        }
    }
}
