//! Server lifecycle: listen, serve, and drain on shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use super::router::create_router;
use super::state::AppState;

/// How long in-flight requests get to finish once a signal arrives.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Serve until SIGINT or SIGTERM, then drain.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    serve_with_shutdown(listener, state, shutdown_signal(), SHUTDOWN_TIMEOUT).await
}

/// Serve until `signal` resolves, then stop accepting connections and wait up
/// to `drain_timeout` for in-flight requests.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    signal: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = &'static str>,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    let env = state.environment;
    let app = create_router(state);

    let drain = Arc::new(Notify::new());
    let graceful = {
        let drain = Arc::clone(&drain);
        async move { drain.notified().await }
    };

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await
    });
    info!(%addr, %env, "starting server");

    tokio::select! {
        joined = &mut server => {
            joined.context("server task failed")?.context("server error")?;
            return Ok(());
        }
        signal = signal => info!(signal, "caught signal"),
    }

    drain.notify_one();
    match tokio::time::timeout(drain_timeout, server).await {
        Ok(joined) => joined.context("server task failed")?.context("server error")?,
        Err(_) => {
            warn!(timeout_secs = drain_timeout.as_secs(), "shutdown deadline exceeded");
            return Err(anyhow!("graceful shutdown timed out after {:?}", drain_timeout));
        }
    }

    info!(%addr, %env, "stopped server");
    Ok(())
}

/// Resolves with the name of the first termination signal received.
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "failed to install SIGINT handler");
                std::future::pending::<&'static str>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<&'static str>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}
