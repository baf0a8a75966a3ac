use thiserror::Error;

use crate::registry::Phase;

/// Structured errors for the service container.
///
/// Every variant is fatal to the `install_services` call that produced it.
/// Nothing is rolled back: services installed or started before the failure
/// stay that way.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("circular dependency detected: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("service '{service}' depends on unregistered '{dependency}'")]
    MissingDependency { service: String, dependency: String },

    #[error("service '{service}' depends on disabled service '{dependency}'")]
    DisabledDependency { service: String, dependency: String },

    #[error("service '{0}' has no factory")]
    FactoryMissing(String),

    #[error("service '{0}' was queried before the start phase")]
    PrematureAccess(String),

    #[error("operation requires the {expected:?} phase, registry is {actual:?}")]
    InvalidPhase { expected: Phase, actual: Phase },

    // Hook failures with service context
    #[error("factory failed for service '{service}'")]
    Factory {
        service: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("install failed for service '{service}'")]
    Install {
        service: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for service '{service}'")]
    Start {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("module '{module}' failed to configure")]
    ModuleConfigure {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ContainerError {
    /// Name of the service the error is about, when there is one.
    pub fn service(&self) -> Option<&str> {
        match self {
            ContainerError::MissingDependency { service, .. }
            | ContainerError::DisabledDependency { service, .. }
            | ContainerError::Factory { service, .. }
            | ContainerError::Install { service, .. }
            | ContainerError::Start { service, .. } => Some(service),
            ContainerError::FactoryMissing(service) | ContainerError::PrematureAccess(service) => {
                Some(service)
            }
            ContainerError::CircularDependency { path } => path.last().map(String::as_str),
            ContainerError::Configuration(_)
            | ContainerError::InvalidPhase { .. }
            | ContainerError::ModuleConfigure { .. } => None,
        }
    }
}
