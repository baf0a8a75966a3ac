use std::sync::Arc;

use aethos_container::{
    AppContext, ModuleRegistrator, ServiceDescriptor, ServiceModule, ServiceRegistry,
};

use crate::service::Greeter;

pub const SERVICE_NAME: &str = "greeter";

#[derive(Debug, Default)]
pub struct GreeterModule;

impl ServiceModule for GreeterModule {
    fn configure(&self, _app: &AppContext, registry: &mut ServiceRegistry) -> anyhow::Result<()> {
        registry.register(
            ServiceDescriptor::new(SERVICE_NAME)
                .depends_on([kv_store::LOGICAL_NAME])
                .with_sync_factory(|| Ok(Greeter::default())),
        );
        Ok(())
    }
}

fn make_module() -> Arc<dyn ServiceModule> {
    Arc::new(GreeterModule)
}

inventory::submit! {
    ModuleRegistrator { id: "greeter", make: make_module }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethos_container::{AppConfig, ContainerError, ModuleCatalog, ModuleLoader};

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .with_module("greeter", GreeterModule)
            .with_module(kv_store::MODULE_ID, kv_store::KvStoreModule)
    }

    #[tokio::test]
    async fn greeter_installs_after_store_and_greets_on_start() {
        let mut registry = ServiceRegistry::default();
        catalog().load(&AppContext::empty(), &mut registry).unwrap();
        registry.install_services(&AppContext::empty()).await.unwrap();

        assert_eq!(registry.install_order(), [kv_store::SERVICE_NAME, SERVICE_NAME]);
        let greeter = registry
            .get_service_as::<Greeter>(SERVICE_NAME)
            .unwrap()
            .unwrap();
        assert_eq!(greeter.visits(), 1);
    }

    #[tokio::test]
    async fn disabling_the_store_module_breaks_greeter() {
        let mut cfg = AppConfig::default();
        cfg.container.disable_modules.insert(kv_store::MODULE_ID.into());
        let mut registry = ServiceRegistry::new(Arc::new(cfg));
        catalog().load(&AppContext::empty(), &mut registry).unwrap();

        let err = registry
            .install_services(&AppContext::empty())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::MissingDependency { ref service, ref dependency }
                if service == "greeter" && dependency == "store"
        ));
    }
}
