//! Shutdown signal handling

use strum_macros::Display;
use tokio::signal;

/// The OS signal that ended the serve loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ShutdownSignal {
    #[strum(serialize = "Ctrl+C")]
    CtrlC,
    #[strum(serialize = "SIGTERM")]
    Terminate,
}

/// Create a future that completes when a shutdown signal is received
///
/// If a signal handler cannot be installed, the error is logged and that
/// signal source is ignored.
///
/// # Example
///
/// ```rust,ignore
/// use pyramidion::lifecycle::shutdown_signal;
///
/// tokio::select! {
///     signal = shutdown_signal() => {
///         tracing::info!("Received {signal}");
///     }
///     _ = server => {}
/// }
/// ```
pub async fn shutdown_signal() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => ShutdownSignal::CtrlC,
        _ = terminate => ShutdownSignal::Terminate,
    };

    tracing::info!("Received {} signal", received);
    received
}
