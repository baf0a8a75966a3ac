use std::any::Any;
use std::sync::Arc;

use aethos_bootstrap::AppConfig;
use async_trait::async_trait;

use crate::context::AppContext;
use crate::descriptor::ServiceHandle;
use crate::registry::ServiceRegistry;

/// Type-erasure helpers, implemented for every `Send + Sync + 'static` type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A service instance owned by the registry once its factory has run.
///
/// Install and start are optional capabilities. A service that has them
/// overrides the matching probe to return `Some(self)`.
pub trait Service: AsAny {
    fn as_installable(&self) -> Option<&dyn Installable> {
        None
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        None
    }
}

/// Install hook: runs once, right after the factory, with the resolved
/// dependencies in declaration order.
#[async_trait]
pub trait Installable: Send + Sync {
    async fn install(
        &self,
        app: &AppContext,
        config: &AppConfig,
        deps: &[ServiceHandle],
    ) -> anyhow::Result<()>;
}

/// Start hook: runs after every service has been installed.
#[async_trait]
pub trait Startable: Send + Sync {
    async fn start(&self, config: &AppConfig) -> anyhow::Result<()>;
}

/// A unit of code that contributes services to the registry.
///
/// Loaders call `configure` during the configuration phase; the module
/// registers its descriptors there. Configuration is reachable through
/// [`ServiceRegistry::config`].
pub trait ServiceModule: Send + Sync + 'static {
    fn configure(&self, app: &AppContext, registry: &mut ServiceRegistry) -> anyhow::Result<()>;
}

/// Recover the concrete type behind a service handle.
pub fn downcast<T: Service>(handle: &ServiceHandle) -> Option<Arc<T>> {
    AsAny::into_any_arc(Arc::clone(handle)).downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Service for Plain {}

    struct Hooked;

    #[async_trait]
    impl Startable for Hooked {
        async fn start(&self, _config: &AppConfig) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Service for Hooked {
        fn as_startable(&self) -> Option<&dyn Startable> {
            Some(self)
        }
    }

    #[test]
    fn capabilities_default_to_absent() {
        let plain: ServiceHandle = Arc::new(Plain);
        assert!(plain.as_installable().is_none());
        assert!(plain.as_startable().is_none());

        let hooked: ServiceHandle = Arc::new(Hooked);
        assert!(hooked.as_installable().is_none());
        assert!(hooked.as_startable().is_some());
    }

    #[test]
    fn downcast_recovers_concrete_type() {
        let handle: ServiceHandle = Arc::new(Plain);
        assert!(downcast::<Plain>(&handle).is_some());
        assert!(downcast::<Hooked>(&handle).is_none());
    }
}
