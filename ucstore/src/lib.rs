pub mod config;
pub mod destination;
pub mod errors;
pub mod lake;
pub mod memory;
pub mod records;
pub mod state;

pub use crate::config::StoreConfig;
pub use crate::destination::{Destination, UpsertOp};
pub use crate::errors::{Result, StoreError};
pub use crate::lake::JsonlLake;
pub use crate::memory::MemoryDestination;
pub use crate::state::SyncState;
