//! Lifecycle Manager
//!
//! Runs startup and shutdown hooks for one application.

use super::{HookList, LifecycleError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Manages lifecycle hooks for an application
///
/// The LifecycleManager is responsible for:
/// - Holding the ordered startup and shutdown hook lists
/// - Executing each phase at most once, in registration order
/// - Handling errors during lifecycle transitions
///
/// # Example
///
/// ```rust,ignore
/// use pyramidion::lifecycle::{LifecycleManager, hook_fn};
///
/// let mut manager = LifecycleManager::new();
/// manager.register_startup(hook_fn("db", || async { Ok(()) }));
///
/// manager.call_startup().await?;
/// // ... application runs ...
/// manager.call_shutdown().await?;
/// ```
#[derive(Debug, Default)]
pub struct LifecycleManager {
    startup_hooks: HookList,
    shutdown_hooks: HookList,
    startup_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager from existing hook lists
    pub fn with_hooks(startup_hooks: HookList, shutdown_hooks: HookList) -> Self {
        Self {
            startup_hooks,
            shutdown_hooks,
            ..Self::default()
        }
    }

    pub fn set_startup_timeout(&mut self, timeout: Option<Duration>) {
        self.startup_timeout = timeout;
    }

    pub fn set_shutdown_timeout(&mut self, timeout: Option<Duration>) {
        self.shutdown_timeout = timeout;
    }

    pub fn startup_timeout(&self) -> Option<Duration> {
        self.startup_timeout
    }

    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }

    pub fn register_startup(&mut self, hook: super::Hook) {
        self.startup_hooks.push(hook);
    }

    pub fn register_shutdown(&mut self, hook: super::Hook) {
        self.shutdown_hooks.push(hook);
    }

    pub fn startup_hooks(&self) -> &HookList {
        &self.startup_hooks
    }

    pub fn shutdown_hooks(&self) -> &HookList {
        &self.shutdown_hooks
    }

    /// Whether the startup phase is running or has completed
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether the shutdown phase has been entered
    pub fn has_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Execute all startup hooks
    ///
    /// Hooks run in registration order and the first failure aborts the
    /// phase. Once startup has succeeded, further calls are no-ops; a failed
    /// or timed out startup may be retried.
    pub async fn call_startup(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Startup hooks already executed, skipping");
            return Ok(());
        }

        let result = match self.startup_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.run_startup())
                .await
                .unwrap_or_else(|_| {
                    Err(LifecycleError::timeout(
                        "startup",
                        format!("Timeout after {:?}", timeout),
                    ))
                }),
            None => self.run_startup().await,
        };

        if result.is_err() {
            self.started.store(false, Ordering::SeqCst);
        }
        result
    }

    async fn run_startup(&self) -> Result<()> {
        tracing::info!("Calling startup hooks...");

        for hook in &self.startup_hooks {
            tracing::debug!("Starting: {}", hook.name());
            hook.run().await.map_err(|e| {
                tracing::error!("Startup hook failed for {}: {}", hook.name(), e);
                LifecycleError::hook_failed(hook.name(), e.to_string())
            })?;
            tracing::debug!("Started: {}", hook.name());
        }

        tracing::info!(
            "Startup complete ({} hooks executed)",
            self.startup_hooks.len()
        );
        Ok(())
    }

    /// Execute all shutdown hooks
    ///
    /// Hooks run in registration order. A failing hook is logged and the
    /// remaining hooks still run. A second call is a no-op.
    pub async fn call_shutdown(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown hooks already executed, skipping");
            return Ok(());
        }

        match self.shutdown_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.run_shutdown())
                .await
                .map_err(|_| {
                    LifecycleError::timeout("shutdown", format!("Timeout after {:?}", timeout))
                }),
            None => {
                self.run_shutdown().await;
                Ok(())
            }
        }
    }

    async fn run_shutdown(&self) {
        tracing::info!("Calling shutdown hooks...");

        for hook in &self.shutdown_hooks {
            tracing::debug!("Shutting down: {}", hook.name());
            if let Err(e) = hook.run().await {
                // Log error but continue with other hooks
                tracing::error!("Shutdown hook failed for {}: {}", hook.name(), e);
            }
            tracing::debug!("Shutdown complete: {}", hook.name());
        }

        tracing::info!(
            "Shutdown complete ({} hooks executed)",
            self.shutdown_hooks.len()
        );
    }
}
