//! Entry point used by host binaries: wires a shutdown trigger to a
//! [`HostRuntime`] and runs configure → install → start → wait.

use std::{future::Future, pin::Pin, sync::Arc};

use aethos_bootstrap::{wait_for_shutdown, AppConfig};
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::loader::ModuleLoader;
use crate::runtime::HostRuntime;

/// What ends the wait phase.
pub enum ShutdownOptions {
    /// Ctrl+C, or SIGTERM on unix.
    Signals,
    /// Cancelled by the caller.
    Token(CancellationToken),
    /// Completes when the future does.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub config: Arc<AppConfig>,
    /// Opaque host context handed to modules and install hooks.
    pub app: AppContext,
    pub loader: Box<dyn ModuleLoader>,
    pub shutdown: ShutdownOptions,
}

/// Turn the shutdown option into a token, spawning a watcher task if needed.
fn arm_shutdown(shutdown: ShutdownOptions) -> CancellationToken {
    match shutdown {
        ShutdownOptions::Token(token) => {
            tracing::debug!("Shutdown controlled by caller token");
            token
        }
        ShutdownOptions::Signals => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                if let Err(e) = wait_for_shutdown().await {
                    tracing::warn!(error = %e, "Signal handler unavailable; waiting on Ctrl+C only");
                    let _ = tokio::signal::ctrl_c().await;
                }
                trigger.cancel();
            });
            token
        }
        ShutdownOptions::Future(waiter) => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("Shutdown future completed");
                trigger.cancel();
            });
            token
        }
    }
}

/// Run the container until shutdown. Configure and install errors are
/// returned before the wait begins.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let cancel = arm_shutdown(opts.shutdown);
    let host = HostRuntime::new(opts.config, opts.app, cancel);
    host.run_full_cycle(opts.loader.as_ref()).await
}
