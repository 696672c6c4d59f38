//! Lifecycle Hooks Module
//!
//! Startup and shutdown hooks for [`Application`](crate::Application).
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Application construction (factory + #[pyramidion])
//!    ↓
//! 2. startup hooks (registration order)   ← Lifecycle Hook
//!    ↓
//! 3. Server start
//!    ↓
//! [Running...]
//!    ↓
//! 4. Shutdown signal (SIGTERM/SIGINT)
//!    ↓
//! 5. shutdown hooks (registration order)  ← Lifecycle Hook
//!    ↓
//! 6. Server stop
//! ```
//!
//! Hooks registered on an application that is later mounted into another one
//! are not run by the parent. The wrapping done by [`crate::pyramidion`]
//! forwards them explicitly.
//!
//! # Example
//!
//! ```rust,ignore
//! use pyramidion::prelude::*;
//!
//! let app = Application::new()
//!     .on_startup(hook_fn("connect-db", || async {
//!         tracing::info!("Opening database pool");
//!         Ok(())
//!     }))
//!     .on_shutdown(hook_fn("close-db", || async {
//!         tracing::info!("Closing database pool");
//!         Ok(())
//!     }));
//! ```

mod error;
mod hook;
mod manager;
mod shutdown;

pub use error::{LifecycleError, Result};
pub use hook::{Hook, HookList, LifecycleEvent, LifecycleHook, hook_fn};
pub use manager::LifecycleManager;
pub use shutdown::{ShutdownSignal, shutdown_signal};
