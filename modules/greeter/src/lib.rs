//! Greeter: a small service that depends on the logical `store` and keeps a
//! visit counter in it.

mod config;
pub mod module;
mod service;

pub use config::GreeterConfig;
pub use module::{GreeterModule, SERVICE_NAME};
pub use service::Greeter;
