use anyhow::Result;
use tokio::signal;

/// Wait for a termination signal (Ctrl+C, or SIGTERM on unix).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| tracing::error!(%e, "Failed to install SIGTERM handler"))?;

        tokio::select! {
            res = signal::ctrl_c() => {
                res.inspect_err(|e| tracing::error!(%e, "Error handling Ctrl+C signal"))?;
                tracing::info!("Received Ctrl+C signal");
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM signal");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .inspect_err(|e| tracing::error!(%e, "Error handling Ctrl+C signal"))?;
        tracing::info!("Received Ctrl+C signal");
    }

    tracing::info!("Shutdown signal received");
    Ok(())
}
