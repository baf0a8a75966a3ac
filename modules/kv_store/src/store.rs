use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use aethos_container::{AppConfig, AppContext, Installable, Service, ServiceHandle, Startable};
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;

use crate::config::KvStoreConfig;
use crate::module::MODULE_ID;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store is full ({capacity} entries)")]
    Full { capacity: usize },
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    capacity: Option<usize>,
    started: AtomicBool,
}

impl MemoryStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or overwrite. Overwrites never count against the capacity.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<(), StoreError> {
        let key = key.into();
        let mut entries = self.entries.write();
        if let Some(capacity) = self.capacity {
            if entries.len() >= capacity && !entries.contains_key(&key) {
                return Err(StoreError::Full { capacity });
            }
        }
        entries.insert(key, value.into());
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Installable for MemoryStore {
    async fn install(
        &self,
        _app: &AppContext,
        config: &AppConfig,
        _deps: &[ServiceHandle],
    ) -> anyhow::Result<()> {
        let cfg: KvStoreConfig = config.service_config(MODULE_ID)?;
        for (k, v) in cfg.seed {
            self.put(k, v)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Startable for MemoryStore {
    async fn start(&self, _config: &AppConfig) -> anyhow::Result<()> {
        self.started.store(true, Ordering::Release);
        info!(entries = self.len(), capacity = ?self.capacity, "Memory store ready");
        Ok(())
    }
}

impl Service for MemoryStore {
    fn as_installable(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }
}
