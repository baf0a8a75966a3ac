use std::sync::Arc;

use aethos_container::{
    AppContext, ModuleRegistrator, ServiceDescriptor, ServiceModule, ServiceRegistry,
};
use anyhow::Context;
use tracing::debug;

use crate::config::KvStoreConfig;
use crate::store::MemoryStore;

pub const MODULE_ID: &str = "kv_store";
/// Registered name of the in-memory store.
pub const SERVICE_NAME: &str = "kv_store.memory";
/// Logical name consumers depend on.
pub const LOGICAL_NAME: &str = "store";

#[derive(Debug, Default)]
pub struct KvStoreModule;

impl ServiceModule for KvStoreModule {
    fn configure(&self, _app: &AppContext, registry: &mut ServiceRegistry) -> anyhow::Result<()> {
        let cfg: KvStoreConfig = registry
            .config()
            .service_config(MODULE_ID)
            .context("kv_store configuration")?;
        debug!(capacity = ?cfg.capacity, seeded = cfg.seed.len(), "Configuring kv_store");

        registry
            .register(
                ServiceDescriptor::new(SERVICE_NAME)
                    .with_sync_factory(move || Ok(MemoryStore::new(cfg.capacity))),
            )
            .default_alias(LOGICAL_NAME, SERVICE_NAME);
        Ok(())
    }
}

fn make_module() -> Arc<dyn ServiceModule> {
    Arc::new(KvStoreModule)
}

inventory::submit! {
    ModuleRegistrator { id: MODULE_ID, make: make_module }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethos_container::{AppConfig, ModuleCatalog, ModuleLoader};

    #[tokio::test]
    async fn store_is_reachable_by_logical_name() {
        let mut cfg = AppConfig::default();
        cfg.services
            .insert(MODULE_ID.into(), serde_json::json!({ "capacity": 8 }));
        let mut registry = ServiceRegistry::new(Arc::new(cfg));

        ModuleCatalog::new()
            .with_module(MODULE_ID, KvStoreModule)
            .load(&AppContext::empty(), &mut registry)
            .unwrap();
        registry.install_services(&AppContext::empty()).await.unwrap();

        let store = registry
            .get_service_as::<MemoryStore>(LOGICAL_NAME)
            .unwrap()
            .unwrap();
        assert!(store.is_started());
        store.put("k", "v").unwrap();
        let again = registry
            .get_service_as::<MemoryStore>(SERVICE_NAME)
            .unwrap()
            .unwrap();
        assert_eq!(again.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn malformed_config_fails_configure() {
        let mut cfg = AppConfig::default();
        cfg.services
            .insert(MODULE_ID.into(), serde_json::json!({ "capacity": "lots" }));
        let mut registry = ServiceRegistry::new(Arc::new(cfg));
        let err = KvStoreModule
            .configure(&AppContext::empty(), &mut registry)
            .unwrap_err();
        assert!(err.to_string().contains("kv_store"));
    }
}
