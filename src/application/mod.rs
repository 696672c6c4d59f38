//! Application Module
//!
//! [`Application`] is a thin layer over an axum [`Router`](axum::Router) that
//! carries the pieces the root-path wrapper needs: a root path, startup and
//! shutdown hook lists, mountable sub-applications, key-value extension state
//! and an optional docs endpoint.

mod app;
mod builder;
mod docs;
mod mount;
mod state;

pub use app::Application;
pub use builder::ApplicationBuilder;
pub use docs::RouteInfo;
pub use mount::MountedPrefix;
pub use state::AppState;
