//! In-memory key/value store, published as `kv_store.memory` and bound to
//! the logical name `store` unless configuration maps it elsewhere.

mod config;
pub mod module;
mod store;

pub use config::KvStoreConfig;
pub use module::{KvStoreModule, LOGICAL_NAME, MODULE_ID, SERVICE_NAME};
pub use store::{MemoryStore, StoreError};
