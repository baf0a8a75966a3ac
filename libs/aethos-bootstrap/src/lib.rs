//! Host bootstrap for the Aethos service container: layered configuration,
//! logging and process signals.

pub mod config;
pub mod logging;
pub mod paths;
pub mod signals;

pub use config::*;
pub use logging::*;
pub use signals::*;
