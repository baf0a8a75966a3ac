use std::sync::Arc;

use aethos_container::{
    downcast, AppConfig, AppContext, Installable, Service, ServiceHandle, Startable,
};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use kv_store::MemoryStore;
use parking_lot::RwLock;
use tracing::info;

use crate::config::GreeterConfig;
use crate::module::SERVICE_NAME;

const VISITS_KEY: &str = "greeter.visits";

#[derive(Default)]
pub struct Greeter {
    config: RwLock<GreeterConfig>,
    store: RwLock<Option<Arc<MemoryStore>>>,
}

impl Greeter {
    /// Compose a greeting and bump the visit counter.
    pub fn greet(&self, who: Option<&str>) -> anyhow::Result<String> {
        let store = self
            .store
            .read()
            .clone()
            .ok_or_else(|| anyhow!("greeter used before install"))?;

        let visits = store
            .get(VISITS_KEY)
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("corrupt visit counter")?
            .unwrap_or(0)
            + 1;
        store.put(VISITS_KEY, visits.to_string())?;

        let cfg = self.config.read();
        let who = who.unwrap_or(&cfg.audience);
        Ok(format!("{}, {who}! (visit #{visits})", cfg.greeting))
    }

    pub fn visits(&self) -> u64 {
        self.store
            .read()
            .as_ref()
            .and_then(|s| s.get(VISITS_KEY))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Installable for Greeter {
    async fn install(
        &self,
        _app: &AppContext,
        config: &AppConfig,
        deps: &[ServiceHandle],
    ) -> anyhow::Result<()> {
        let handle = deps
            .first()
            .ok_or_else(|| anyhow!("greeter needs a store dependency"))?;
        let store = downcast::<MemoryStore>(handle)
            .ok_or_else(|| anyhow!("the 'store' binding is not an in-memory store"))?;

        *self.config.write() = config.service_config(SERVICE_NAME)?;
        *self.store.write() = Some(store);
        Ok(())
    }
}

#[async_trait]
impl Startable for Greeter {
    async fn start(&self, _config: &AppConfig) -> anyhow::Result<()> {
        let line = self.greet(None)?;
        info!(greeting = %line, "Greeter started");
        Ok(())
    }
}

impl Service for Greeter {
    fn as_installable(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }
}
