//! Host Runtime - composition root for the container lifecycle
//!
//! Owns the registry and drives it through: configure (modules) → install →
//! start → wait.

use std::sync::Arc;

use aethos_bootstrap::AppConfig;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::error::ContainerError;
use crate::loader::ModuleLoader;
use crate::registry::{Phase, ServiceRegistry};

pub struct HostRuntime {
    app: AppContext,
    registry: ServiceRegistry,
    cancel: CancellationToken,
}

impl HostRuntime {
    /// Prepare a runtime. No module is configured until [`load`](Self::load).
    pub fn new(config: Arc<AppConfig>, app: AppContext, cancel: CancellationToken) -> Self {
        Self {
            app,
            registry: ServiceRegistry::new(config),
            cancel,
        }
    }

    /// CONFIGURE phase: let the loader's modules register their services.
    pub fn load(&mut self, loader: &dyn ModuleLoader) -> Result<usize, ContainerError> {
        tracing::info!("Phase: configure");
        loader.load(&self.app, &mut self.registry)
    }

    /// INSTALL + START phases.
    pub async fn start(&mut self) -> Result<(), ContainerError> {
        self.registry.install_services(&self.app).await
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Registration stays open until `start`; hosts can add their own
    /// services here.
    pub fn registry_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> ServiceRegistry {
        self.registry
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Full cycle: configure → install → start → wait for cancellation.
    pub async fn run_full_cycle(mut self, loader: &dyn ModuleLoader) -> anyhow::Result<()> {
        let modules = self.load(loader)?;
        tracing::debug!(modules, services = self.registry.len(), "Configuration complete");

        self.start().await?;
        debug_assert_eq!(self.registry.phase(), Phase::Ready);
        tracing::info!(services = self.registry.len(), "Container ready");

        tracing::info!("Phase: wait");
        self.cancel.cancelled().await;
        tracing::info!("Shutdown requested; container exiting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{Service, Startable, ServiceModule};
    use crate::descriptor::ServiceDescriptor;
    use crate::loader::ModuleCatalog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Startable for Counter {
        async fn start(&self, _config: &AppConfig) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Service for Counter {
        fn as_startable(&self) -> Option<&dyn Startable> {
            Some(self)
        }
    }

    struct CounterModule;

    impl ServiceModule for CounterModule {
        fn configure(&self, _app: &AppContext, registry: &mut ServiceRegistry) -> anyhow::Result<()> {
            registry.register(ServiceDescriptor::new("counter").with_instance(Counter::default()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_then_start() {
        let mut rt = HostRuntime::new(
            Arc::new(AppConfig::default()),
            AppContext::empty(),
            CancellationToken::new(),
        );
        let catalog = ModuleCatalog::new().with_module("counter", CounterModule);
        assert_eq!(rt.load(&catalog).unwrap(), 1);
        rt.start().await.unwrap();

        let counter = rt
            .registry()
            .get_service_as::<Counter>("counter")
            .unwrap()
            .unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(rt.into_registry().phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn full_cycle_returns_after_cancel() {
        let cancel = CancellationToken::new();
        let rt = HostRuntime::new(
            Arc::new(AppConfig::default()),
            AppContext::empty(),
            cancel.clone(),
        );
        cancel.cancel();
        let catalog = ModuleCatalog::new().with_module("counter", CounterModule);
        rt.run_full_cycle(&catalog).await.unwrap();
    }
}
