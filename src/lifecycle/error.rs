//! Lifecycle-specific error types

use thiserror::Error;

/// Errors that can occur while running lifecycle hooks
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Operation timed out
    #[error("Timeout during {phase}: {message}")]
    Timeout {
        /// The lifecycle phase where timeout occurred
        phase: String,
        /// Additional error message
        message: String,
    },

    /// A single hook returned an error
    #[error("Hook execution failed for {hook}: {message}")]
    HookFailed {
        /// Name of the hook that failed
        hook: String,
        /// Error message
        message: String,
    },

    /// Event name did not match `startup` or `shutdown`
    #[error("Unknown lifecycle event: {0}")]
    UnknownEvent(String),
}

impl LifecycleError {
    /// Create a timeout error
    pub fn timeout(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Create a hook failure error
    pub fn hook_failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
