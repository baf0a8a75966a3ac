use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration for the kv_store module (`services.kv_store`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KvStoreConfig {
    /// Maximum number of entries; unbounded when absent.
    #[serde(default)]
    pub capacity: Option<usize>,
    /// Entries written during install.
    #[serde(default)]
    pub seed: BTreeMap<String, String>,
}
