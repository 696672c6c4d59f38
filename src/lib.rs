//! # Pyramidion
//!
//! Serve an axum application under its own root path.
//!
//! An application that declares a root path (for example `/api`) is usually
//! deployed behind a proxy that strips the prefix. Pyramidion lets the same
//! application run standalone: the factory that builds it is wrapped so the
//! application gets mounted at its root path on a fresh outer application,
//! its startup/shutdown hooks are forwarded, and `GET /` redirects to the root
//! path with `301 Moved Permanently`.
//!
//! ## Features
//!
//! - **`#[pyramidion]`**: attribute for factory functions, sync or async,
//!   plain or `Result`-returning
//! - **Function form**: [`pyramidion()`], [`try_pyramidion`] and
//!   [`wrap_application`]
//! - **Application layer**: [`Application`] with mounts, lifecycle hooks,
//!   extension state and a docs endpoint on top of axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pyramidion::prelude::*;
//!
//! #[pyramidion]
//! fn create_app() -> Application {
//!     Application::builder()
//!         .root_path("/test")
//!         .build()
//!         .get("/", || async {
//!             Json(serde_json::json!({ "detail": { "msg": "hello world!" } }))
//!         })
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = create_app();
//!
//!     // GET /      -> 301, Location: /test
//!     // GET /test/ -> 200 {"detail": {"msg": "hello world!"}}
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     app.serve(listener).await?;
//!     Ok(())
//! }
//! ```

extern crate self as pyramidion;

pub mod application;
pub mod config;
pub mod error;
pub mod lifecycle;
mod wrap;

pub use application::{AppState, Application, ApplicationBuilder, MountedPrefix};
pub use config::{ConfigService, ServerConfig};
pub use error::{PyramidionError, Result};
pub use wrap::{STATE_KEY, base_application, pyramidion, try_pyramidion, wrap_application};

#[doc(hidden)]
pub use wrap::__private;

pub use pyramidion_macro::pyramidion;

pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use pyramidion::prelude::*;
/// ```
pub mod prelude {
    pub use crate::application::{AppState, Application, ApplicationBuilder, MountedPrefix};
    pub use crate::config::{ConfigService, ServerConfig};
    pub use crate::error::{PyramidionError, Result};
    pub use crate::lifecycle::{
        Hook, HookList, LifecycleError, LifecycleEvent, LifecycleHook, LifecycleManager,
        hook_fn, shutdown_signal,
    };
    pub use crate::{base_application, pyramidion, try_pyramidion, wrap_application};
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
