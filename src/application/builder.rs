use super::Application;
use crate::config::ServerConfig;
use crate::lifecycle::{Hook, HookList, LifecycleManager};
use std::time::Duration;

pub(crate) const DEFAULT_TITLE: &str = "Pyramidion";
pub(crate) const DEFAULT_VERSION: &str = "0.1.0";
pub(crate) const DEFAULT_OPENAPI_URL: &str = "/openapi.json";

/// Builder for [`Application`]
///
/// # Example
///
/// ```
/// use pyramidion::Application;
///
/// let app = Application::builder()
///     .title("Inventory")
///     .root_path("/inventory/")
///     .build();
///
/// assert_eq!(app.root_path(), Some("/inventory"));
/// assert_eq!(app.openapi_url(), Some("/openapi.json"));
/// ```
pub struct ApplicationBuilder {
    title: String,
    version: String,
    root_path: Option<String>,
    openapi_url: Option<String>,
    startup_hooks: HookList,
    shutdown_hooks: HookList,
    startup_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            root_path: None,
            openapi_url: Some(DEFAULT_OPENAPI_URL.to_string()),
            startup_hooks: HookList::new(),
            shutdown_hooks: HookList::new(),
            startup_timeout: None,
            shutdown_timeout: None,
        }
    }

    /// Title shown in the docs document
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Version shown in the docs document
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Path prefix this application expects to be served under
    ///
    /// Trailing slashes are trimmed and a leading slash is added when
    /// missing. An empty value (or `/`) leaves the root path unset.
    pub fn root_path(mut self, root_path: impl AsRef<str>) -> Self {
        self.root_path = normalize_prefix(root_path.as_ref());
        self
    }

    /// Serve the docs document at `url`
    ///
    /// A leading slash is added when missing. An empty value (or `/`)
    /// disables the docs document.
    pub fn openapi_url(mut self, url: impl AsRef<str>) -> Self {
        self.openapi_url = normalize_prefix(url.as_ref());
        self
    }

    /// Do not expose a docs document
    pub fn without_docs(mut self) -> Self {
        self.openapi_url = None;
        self
    }

    /// Replace the startup hook list
    pub fn on_startup(mut self, hooks: HookList) -> Self {
        self.startup_hooks = hooks;
        self
    }

    /// Replace the shutdown hook list
    pub fn on_shutdown(mut self, hooks: HookList) -> Self {
        self.shutdown_hooks = hooks;
        self
    }

    /// Append a single startup hook
    pub fn startup_hook(mut self, hook: Hook) -> Self {
        self.startup_hooks.push(hook);
        self
    }

    /// Append a single shutdown hook
    pub fn shutdown_hook(mut self, hook: Hook) -> Self {
        self.shutdown_hooks.push(hook);
        self
    }

    /// Set a timeout for the whole startup phase
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    /// Set a timeout for the whole shutdown phase
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Apply the root path and lifecycle timeouts from a [`ServerConfig`]
    ///
    /// Settings missing from `config` keep their current value.
    pub fn with_server_config(mut self, config: &ServerConfig) -> Self {
        if let Some(root_path) = &config.root_path {
            self.root_path = normalize_prefix(root_path);
        }
        self.startup_timeout = config.startup_timeout.or(self.startup_timeout);
        self.shutdown_timeout = config.shutdown_timeout.or(self.shutdown_timeout);
        self
    }

    pub fn build(self) -> Application {
        let mut lifecycle = LifecycleManager::with_hooks(self.startup_hooks, self.shutdown_hooks);
        lifecycle.set_startup_timeout(self.startup_timeout);
        lifecycle.set_shutdown_timeout(self.shutdown_timeout);

        Application::from_parts(
            self.title,
            self.version,
            self.root_path,
            self.openapi_url,
            lifecycle,
        )
    }
}

/// Normalize a path prefix; `None` means "no prefix"
pub(crate) fn normalize_prefix(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}
