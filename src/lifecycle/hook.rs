//! Lifecycle hook types
//!
//! A hook is any async callable that returns `anyhow::Result<()>`. Hooks are
//! kept in ordered [`HookList`]s; cloning a list copies the list itself while
//! the hooks inside stay shared.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle events an application can attach hooks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleEvent {
    /// Runs before the application starts serving requests
    Startup,
    /// Runs after the server stopped accepting requests
    Shutdown,
}

/// A callable registered against a [`LifecycleEvent`]
///
/// # Example
///
/// ```rust,ignore
/// use pyramidion::lifecycle::LifecycleHook;
/// use async_trait::async_trait;
///
/// struct WarmCache;
///
/// #[async_trait]
/// impl LifecycleHook for WarmCache {
///     async fn run(&self) -> anyhow::Result<()> {
///         tracing::info!("Warming cache");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Execute the hook
    async fn run(&self) -> anyhow::Result<()>;

    /// Name used in logs and error messages
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a hook
pub type Hook = Arc<dyn LifecycleHook>;

/// A named closure hook, created with [`hook_fn`]
struct FnHook<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> LifecycleHook for FnHook<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.f)().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap an async closure into a [`Hook`]
///
/// ```rust,ignore
/// let hook = hook_fn("flush-metrics", || async { Ok(()) });
/// ```
pub fn hook_fn<F, Fut>(name: impl Into<String>, f: F) -> Hook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHook {
        name: name.into(),
        f,
    })
}

/// Ordered list of hooks for one lifecycle event
#[derive(Clone, Default)]
pub struct HookList {
    hooks: Vec<Hook>,
}

impl HookList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook, keeping registration order
    pub fn push(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hook> {
        self.hooks.iter()
    }

    /// Hook names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }
}

impl fmt::Debug for HookList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<'a> IntoIterator for &'a HookList {
    type Item = &'a Hook;
    type IntoIter = std::slice::Iter<'a, Hook>;

    fn into_iter(self) -> Self::IntoIter {
        self.hooks.iter()
    }
}
