//! Serving a router.
//!
//! Thin helpers over [`axum::serve`] that attach the peer address to every
//! request (so [`Context::remote_address`] works) and shut down gracefully
//! when a [`CancellationToken`] fires.
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use trellis_axum::{serve, AxumAdapter};
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! let shutdown = trellis_axum::shutdown_on_signal();
//! serve(listener, adapter.into_router(), shutdown).await?;
//! ```
//!
//! [`Context::remote_address`]: trellis_core::Context::remote_address

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use trellis_config::ServerConfig;

use crate::error::ServeError;

/// Serves `router` on `listener` until `shutdown` is cancelled, then waits
/// for in-flight requests to finish.
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    let addr = listener.local_addr().map_err(ServeError::Io)?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.cancelled().await;
        tracing::info!("shutdown signal received, draining connections");
    })
    .await
    .map_err(ServeError::Io)?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Binds the configured address and serves `router`.
///
/// After `shutdown` fires, in-flight requests get the configured shutdown
/// timeout to complete; connections still open after that are dropped.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the address cannot be bound, or
/// [`ServeError::Io`] if the listener fails.
pub async fn run(
    router: Router,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), ServeError> {
    let listener = TcpListener::bind(config.http_addr.as_str())
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.http_addr.clone(),
            source,
        })?;

    let grace = config.shutdown_timeout();
    let drain = shutdown.clone();
    let server = serve(listener, router, shutdown);

    tokio::select! {
        result = server => result,
        () = async move {
            drain.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                timeout_secs = grace.as_secs(),
                "shutdown timeout reached, dropping open connections"
            );
            Ok(())
        }
    }
}

/// Returns a token that is cancelled on SIGTERM or SIGINT (Ctrl+C elsewhere).
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn shutdown_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_os_signal().await;
        trigger.cancel();
    });
    token
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("received SIGTERM, initiating graceful shutdown");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("received SIGINT, initiating graceful shutdown");
                    }
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "failed to install signal handlers, falling back to Ctrl+C");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, initiating graceful shutdown"),
        Err(e) => tracing::error!(error = %e, "failed to wait for Ctrl+C"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, Router::new(), shutdown.clone()));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            http_addr: taken.local_addr().unwrap().to_string(),
            ..ServerConfig::default()
        };
        let err = run(Router::new(), &config, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }
}
