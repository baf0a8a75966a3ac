//! # Aethos Container - dependency-aware service bootstrap
//!
//! Independently authored modules register named services, each declaring the
//! services it depends on. The [`ServiceRegistry`] installs every service
//! exactly once, dependencies first, and then starts them in registration
//! order.
//!
//! ## Lifecycle
//!
//! - **Configuring**: loaders call each module's `configure`, which calls
//!   [`ServiceRegistry::register`].
//! - **Installing**: [`ServiceRegistry::install_services`] walks the dependency
//!   graph depth-first, applying the alias map and the disable list.
//! - **Starting**: start hooks run one at a time in registration order.
//! - **Ready**: every start hook has completed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aethos_container::{AppContext, Service, ServiceDescriptor, ServiceRegistry};
//!
//! struct Clock;
//! impl Service for Clock {}
//!
//! let mut registry = ServiceRegistry::default();
//! registry
//!     .register(ServiceDescriptor::new("clock").with_instance(Clock))
//!     .register(ServiceDescriptor::new("scheduler").depends_on(["clock"]).with_instance(Clock));
//! registry.install_services(&AppContext::empty()).await?;
//! let clock = registry.get_service_as::<Clock>("clock")?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Re-export inventory so modules can submit registrators without a direct dependency
pub use inventory;

pub mod context;
pub mod contracts;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod registry;
pub mod runtime;

pub use context::AppContext;
pub use contracts::{downcast, AsAny, Installable, Service, ServiceModule, Startable};
pub use descriptor::{ServiceDescriptor, ServiceFactory, ServiceHandle, ServiceState};
pub use error::ContainerError;
pub use loader::{FolderLoader, ModuleCatalog, ModuleEntry, ModuleLoader, ModuleRegistrator};
pub use registry::{Phase, ServiceRegistry};
pub use runtime::{run, HostRuntime, RunOptions, ShutdownOptions};

pub use aethos_bootstrap::AppConfig;
