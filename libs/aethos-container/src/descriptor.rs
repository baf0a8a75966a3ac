use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::contracts::Service;

/// Shared handle to an installed service instance.
pub type ServiceHandle = Arc<dyn Service>;

/// Zero-argument, possibly asynchronous constructor for a service instance.
/// Consumed on first use, so a descriptor's factory can run at most once.
pub type ServiceFactory =
    Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<ServiceHandle>> + Send + Sync>;

/// Per-descriptor install state.
///
/// `Registered → Installing → Installed` or `Registered → Disabled`.
/// Both `Installed` and `Disabled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Registered,
    Installing,
    Installed,
    Disabled,
}

impl ServiceState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ServiceState::Installed | ServiceState::Disabled)
    }
}

/// Registration record for one service: its name, the names it depends on,
/// and the factory that builds it.
pub struct ServiceDescriptor {
    name: String,
    dependencies: Vec<String>,
    factory: Option<ServiceFactory>,
    instance: Option<ServiceHandle>,
    state: ServiceState,
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("has_factory", &self.factory.is_some())
            .field("has_instance", &self.instance.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            factory: None,
            instance: None,
            state: ServiceState::Registered,
        }
    }

    /// Declare dependencies by (logical) name. Order is preserved and is the
    /// order the install hook receives the resolved instances in.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Asynchronous factory.
    pub fn with_factory<F, Fut, S>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
        S: Service,
    {
        self.factory = Some(Box::new(move || {
            let fut = factory();
            Box::pin(async move {
                let service = fut.await?;
                Ok(Arc::new(service) as ServiceHandle)
            })
        }));
        self
    }

    /// Synchronous factory.
    pub fn with_sync_factory<F, S>(self, factory: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<S> + Send + Sync + 'static,
        S: Service,
    {
        self.with_factory(move || async move { factory() })
    }

    /// Factory that hands out an already constructed value.
    pub fn with_instance<S: Service>(self, service: S) -> Self {
        self.with_factory(move || async move { Ok(service) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn instance(&self) -> Option<&ServiceHandle> {
        self.instance.as_ref()
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    pub(crate) fn take_factory(&mut self) -> Option<ServiceFactory> {
        self.factory.take()
    }

    pub(crate) fn begin_install(&mut self) {
        debug_assert_eq!(self.state, ServiceState::Registered);
        self.state = ServiceState::Installing;
    }

    pub(crate) fn finish_install(&mut self, instance: ServiceHandle) {
        debug_assert_eq!(self.state, ServiceState::Installing);
        self.instance = Some(instance);
        self.state = ServiceState::Installed;
    }

    pub(crate) fn disable(&mut self) {
        debug_assert!(matches!(
            self.state,
            ServiceState::Registered | ServiceState::Disabled
        ));
        self.state = ServiceState::Disabled;
    }
}
