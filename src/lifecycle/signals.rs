//! OS signal handling.
//!
//! SIGTERM and SIGINT both translate into the internal shutdown signal;
//! the server then stops accepting and drains in-flight connections.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for SIGTERM or SIGINT.
pub async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
            }
            _ = wait_for_ctrl_c() => {}
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received SIGINT"),
        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
    }
}

/// Spawn a task that triggers `shutdown` once a termination signal arrives.
pub fn spawn_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    })
}
