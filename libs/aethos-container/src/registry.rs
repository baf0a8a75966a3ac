use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use aethos_bootstrap::AppConfig;
use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::contracts;
use crate::descriptor::{ServiceDescriptor, ServiceHandle, ServiceState};
use crate::error::ContainerError;

/// Registry-wide lifecycle marker. Ordered: `Configuring < Installing < Starting < Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Configuring,
    Installing,
    Starting,
    Ready,
}

/// Owns every service descriptor and drives install → start.
///
/// Constructed once by the composition root and passed by `&mut` to loaders
/// during configuration. `install_services` takes `&mut self`, so one
/// resolution owns the registry for the whole install fold.
pub struct ServiceRegistry {
    config: Arc<AppConfig>,
    descriptors: Vec<ServiceDescriptor>, // registration order
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    disabled_services: HashSet<String>,
    disabled_modules: HashSet<String>,
    phase: Phase,
    // names currently in `Installing`, outermost first
    install_path: Vec<String>,
    install_order: Vec<String>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.descriptors.iter().map(|d| d.name()).collect();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .field("aliases", &self.aliases)
            .field("disabled_services", &self.disabled_services)
            .field("phase", &self.phase)
            .finish()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(AppConfig::default()))
    }
}

impl ServiceRegistry {
    /// Build an empty registry; aliases and disable lists come from `config.container`.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let container = &config.container;
        let aliases = container.service_map.clone().into_iter().collect();
        let disabled_services = container.disable_services.iter().cloned().collect();
        let disabled_modules = container.disable_modules.iter().cloned().collect();

        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            aliases,
            disabled_services,
            disabled_modules,
            phase: Phase::Configuring,
            install_path: Vec::new(),
            install_order: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn ensure_phase(&self, expected: Phase) -> Result<(), ContainerError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ContainerError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Register a descriptor, replacing any previous one with the same name.
    ///
    /// The replacement keeps the original registration slot, so start order
    /// is decided by the first registration of a name. Outside the
    /// configuration phase the descriptor is dropped and an error is logged;
    /// use [`try_register`](Self::try_register) to observe that.
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        if let Err(e) = self.try_register(descriptor) {
            tracing::error!(error = %e, "Service registration ignored");
        }
        self
    }

    pub fn try_register(
        &mut self,
        descriptor: ServiceDescriptor,
    ) -> Result<&mut Self, ContainerError> {
        self.ensure_phase(Phase::Configuring)?;

        match self.index.get(descriptor.name()) {
            Some(&slot) => {
                debug!(service = descriptor.name(), "Replacing registered service");
                self.descriptors[slot] = descriptor;
            }
            None => {
                debug!(
                    service = descriptor.name(),
                    deps = ?descriptor.dependencies(),
                    "Registering service"
                );
                self.index
                    .insert(descriptor.name().to_owned(), self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
        Ok(self)
    }

    /// Map a logical dependency name onto a registered one. Later calls for
    /// the same logical name overwrite earlier ones.
    pub fn alias(&mut self, logical: impl Into<String>, actual: impl Into<String>) -> &mut Self {
        self.aliases.insert(logical.into(), actual.into());
        self
    }

    /// Like [`alias`](Self::alias), but leaves an existing mapping (e.g. from
    /// configuration) untouched. Lets a module ship a default binding.
    pub fn default_alias(
        &mut self,
        logical: impl Into<String>,
        actual: impl Into<String>,
    ) -> &mut Self {
        self.aliases.entry(logical.into()).or_insert_with(|| actual.into());
        self
    }

    pub fn disable_service(&mut self, name: impl Into<String>) -> &mut Self {
        self.disabled_services.insert(name.into());
        self
    }

    pub fn is_module_disabled(&self, module: &str) -> bool {
        self.disabled_modules.contains(module)
    }

    /// Apply the alias map to `name`. Unmapped names resolve to themselves.
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(self.resolve_alias(name))
    }

    /// Registered names in registration order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Install state of the descriptor `name` resolves to. Valid in any phase.
    pub fn state_of(&self, name: &str) -> Option<ServiceState> {
        self.index
            .get(self.resolve_alias(name))
            .map(|&i| self.descriptors[i].state())
    }

    /// Names in the order their installs completed.
    pub fn install_order(&self) -> &[String] {
        &self.install_order
    }

    // ---------------------------------------------------------------------
    // install
    // ---------------------------------------------------------------------

    /// Install every registered service, dependencies first, then start them
    /// in registration order.
    ///
    /// Each registered descriptor is visited under its own name; the alias
    /// map applies only to dependency lookups and queries.
    ///
    /// Fails on the first error; partial progress is kept.
    pub async fn install_services(&mut self, app: &AppContext) -> Result<(), ContainerError> {
        self.ensure_phase(Phase::Configuring)?;
        self.phase = Phase::Installing;
        self.install_path.clear();
        info!(services = self.descriptors.len(), "Phase: install");

        for slot in 0..self.descriptors.len() {
            let name = self.descriptors[slot].name().to_owned();
            self.install_slot(slot, &name, None, app).await?;
        }

        debug_assert!(self.descriptors.iter().all(|d| d.state().is_terminal()));
        info!(order = ?self.install_order, "Service install order resolved");

        self.phase = Phase::Starting;
        self.run_start_phase().await?;

        self.phase = Phase::Ready;
        info!("All services started");
        Ok(())
    }

    /// Resolve a declared dependency of `dependent` and install it.
    async fn install_dependency(
        &mut self,
        dependent: &str,
        requested: &str,
        app: &AppContext,
    ) -> Result<ServiceHandle, ContainerError> {
        let actual = self.resolve_alias(requested);
        let Some(&slot) = self.index.get(actual) else {
            return Err(ContainerError::MissingDependency {
                service: dependent.to_owned(),
                dependency: requested.to_owned(),
            });
        };

        // With a dependent set, a disabled target is an error rather than `None`.
        self.install_slot(slot, requested, Some(dependent), app)
            .await?
            .ok_or_else(|| ContainerError::DisabledDependency {
                service: dependent.to_owned(),
                dependency: requested.to_owned(),
            })
    }

    /// Depth-first install of the descriptor at `slot`.
    ///
    /// `requested` is the name the caller asked for (pre-alias), used for the
    /// disable check and error messages. Returns `None` only for a disabled
    /// service nobody depends on.
    fn install_slot<'a>(
        &'a mut self,
        slot: usize,
        requested: &'a str,
        dependent: Option<&'a str>,
        app: &'a AppContext,
    ) -> BoxFuture<'a, Result<Option<ServiceHandle>, ContainerError>> {
        Box::pin(async move {
            let name = self.descriptors[slot].name().to_owned();

            match self.descriptors[slot].state() {
                ServiceState::Installed => {
                    return Ok(self.descriptors[slot].instance().cloned());
                }
                ServiceState::Disabled => return self.disabled_outcome(requested, dependent),
                ServiceState::Installing => {
                    // The state is set before any await, so re-entry here is always a cycle.
                    let start = self
                        .install_path
                        .iter()
                        .position(|n| *n == name)
                        .unwrap_or(0);
                    let mut path = self.install_path[start..].to_vec();
                    path.push(name);
                    return Err(ContainerError::CircularDependency { path });
                }
                ServiceState::Registered => {}
            }

            if self.is_disabled(&name) {
                self.descriptors[slot].disable();
                info!(service = %name, "Service disabled by configuration; skipping install");
                return self.disabled_outcome(requested, dependent);
            }

            self.descriptors[slot].begin_install();
            self.install_path.push(name.clone());
            let built = self.construct(slot, &name, app).await;
            self.install_path.pop();
            let instance = built?;

            self.descriptors[slot].finish_install(Arc::clone(&instance));
            self.install_order.push(name);
            Ok(Some(instance))
        })
    }

    /// Whether `registered` is disabled directly or through a disabled
    /// logical name that maps onto it.
    fn is_disabled(&self, registered: &str) -> bool {
        self.disabled_services
            .iter()
            .any(|d| d == registered || self.resolve_alias(d) == registered)
    }

    /// Dependencies, factory and install hook for a descriptor in `Installing`.
    async fn construct(
        &mut self,
        slot: usize,
        name: &str,
        app: &AppContext,
    ) -> Result<ServiceHandle, ContainerError> {
        let deps = self.descriptors[slot].dependencies().to_vec();
        let mut resolved = Vec::with_capacity(deps.len());
        for dep in &deps {
            resolved.push(self.install_dependency(name, dep, app).await?);
        }

        let factory = self.descriptors[slot]
            .take_factory()
            .ok_or_else(|| ContainerError::FactoryMissing(name.to_owned()))?;

        debug!(service = %name, "Constructing service");
        let instance = factory()
            .await
            .map_err(|source| ContainerError::Factory {
                service: name.to_owned(),
                source,
            })?;

        match instance.as_installable() {
            Some(hook) => {
                debug!(service = %name, deps = resolved.len(), "Running install hook");
                hook.install(app, &self.config, &resolved)
                    .await
                    .map_err(|source| ContainerError::Install {
                        service: name.to_owned(),
                        source,
                    })?;
            }
            None => debug!(service = %name, "Service has no install hook"),
        }

        Ok(instance)
    }

    fn disabled_outcome(
        &self,
        requested: &str,
        dependent: Option<&str>,
    ) -> Result<Option<ServiceHandle>, ContainerError> {
        match dependent {
            Some(service) => Err(ContainerError::DisabledDependency {
                service: service.to_owned(),
                dependency: requested.to_owned(),
            }),
            None => Ok(None),
        }
    }

    // ---------------------------------------------------------------------
    // start
    // ---------------------------------------------------------------------

    /// START phase: one service at a time, in registration order.
    async fn run_start_phase(&self) -> Result<(), ContainerError> {
        info!("Phase: start");

        for d in &self.descriptors {
            let (ServiceState::Installed, Some(instance)) = (d.state(), d.instance()) else {
                continue;
            };
            match instance.as_startable() {
                Some(hook) => {
                    debug!(service = d.name(), "Starting service");
                    hook.start(&self.config)
                        .await
                        .map_err(|source| ContainerError::Start {
                            service: d.name().to_owned(),
                            source,
                        })?;
                }
                None => debug!(service = d.name(), "Service has no start hook; skipping"),
            }
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // query
    // ---------------------------------------------------------------------

    /// Look up an installed instance by (logical) name.
    ///
    /// Valid once the start phase has begun; never installs anything.
    pub fn get_service(&self, name: &str) -> Result<Option<ServiceHandle>, ContainerError> {
        if self.phase < Phase::Starting {
            return Err(ContainerError::PrematureAccess(name.to_owned()));
        }
        let actual = self.resolve_alias(name);
        let found = self
            .index
            .get(actual)
            .and_then(|&i| self.descriptors[i].instance().cloned());
        if found.is_none() {
            debug!(service = name, resolved = actual, "Service lookup found no instance");
        }
        Ok(found)
    }

    /// [`get_service`](Self::get_service) plus a downcast to the concrete type.
    /// A type mismatch yields `None`.
    pub fn get_service_as<T: contracts::Service>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        Ok(self
            .get_service(name)?
            .and_then(|handle| contracts::downcast::<T>(&handle)))
    }
}
