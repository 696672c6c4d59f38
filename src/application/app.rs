use super::builder::{ApplicationBuilder, normalize_prefix};
use super::docs::{OpenApiDocument, RouteInfo};
use super::mount::{MountPoint, MountService};
use super::state::AppState;
use crate::lifecycle::{
    Hook, HookList, LifecycleError, LifecycleEvent, LifecycleManager, shutdown_signal,
};
use axum::{
    Json, Router,
    handler::Handler,
    http::Method,
    routing::{self, MethodRouter},
};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

/// An axum application with a root path, lifecycle hooks and extension state
///
/// Routes are registered builder-style, the same way as on an axum
/// [`Router`]. Sub-applications are attached with [`Application::mount`];
/// their lifecycle hooks are not run by the parent.
///
/// # Example
///
/// ```rust,no_run
/// use pyramidion::prelude::*;
///
/// # async fn run() -> pyramidion::Result<()> {
/// let app = Application::builder()
///     .root_path("/api")
///     .build()
///     .get("/health", || async { "ok" })
///     .on_startup(hook_fn("announce", || async {
///         tracing::info!("starting");
///         Ok(())
///     }));
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
/// app.serve(listener).await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    id: Uuid,
    title: String,
    version: String,
    root_path: Option<String>,
    openapi_url: Option<String>,
    router: Router,
    routes: Vec<RouteInfo>,
    mounts: Vec<(String, Arc<Application>)>,
    lifecycle: LifecycleManager,
    state: AppState,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Create an application with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn from_parts(
        title: String,
        version: String,
        root_path: Option<String>,
        openapi_url: Option<String>,
        lifecycle: LifecycleManager,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            version,
            root_path,
            openapi_url,
            router: Router::new(),
            routes: Vec::new(),
            mounts: Vec::new(),
            lifecycle,
            state: AppState::new(),
        }
    }

    /// Unique id of this instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The prefix this application expects to be served under, if any
    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    pub fn openapi_url(&self) -> Option<&str> {
        self.openapi_url.as_deref()
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn startup_hooks(&self) -> &HookList {
        self.lifecycle.startup_hooks()
    }

    pub fn shutdown_hooks(&self) -> &HookList {
        self.lifecycle.shutdown_hooks()
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Extension state attached to this instance
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Mounted sub-applications and their prefixes
    pub fn mounts(&self) -> impl Iterator<Item = (&str, &Arc<Application>)> {
        self.mounts.iter().map(|(prefix, app)| (prefix.as_str(), app))
    }

    /// Add a route with an arbitrary method router
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self.routes.push(RouteInfo {
            path: path.to_string(),
            method: None,
        });
        self
    }

    fn method_route(mut self, path: &str, method: Method, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self.routes.push(RouteInfo {
            path: path.to_string(),
            method: Some(method.as_str().to_ascii_lowercase()),
        });
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.method_route(path, Method::GET, routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.method_route(path, Method::POST, routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.method_route(path, Method::PUT, routing::put(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.method_route(path, Method::PATCH, routing::patch(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.method_route(path, Method::DELETE, routing::delete(handler))
    }

    /// Mount a sub-application under `path`
    ///
    /// Requests to `path` or `path/...` are handed to the sub-application with
    /// the prefix stripped. The sub-application's own root path is ignored.
    pub fn mount(mut self, path: &str, app: impl Into<Arc<Application>>) -> Self {
        let prefix = normalize_prefix(path).unwrap_or_default();
        self.mounts.push((prefix, app.into()));
        self
    }

    /// Register a startup hook
    pub fn on_startup(mut self, hook: Hook) -> Self {
        self.lifecycle.register_startup(hook);
        self
    }

    /// Register a shutdown hook
    pub fn on_shutdown(mut self, hook: Hook) -> Self {
        self.lifecycle.register_shutdown(hook);
        self
    }

    /// Register a hook for `event`
    pub fn on_event(self, event: LifecycleEvent, hook: Hook) -> Self {
        match event {
            LifecycleEvent::Startup => self.on_startup(hook),
            LifecycleEvent::Shutdown => self.on_shutdown(hook),
        }
    }

    /// Register a hook by event name (`"startup"` or `"shutdown"`)
    pub fn add_event_handler(self, event: &str, hook: Hook) -> Result<Self, LifecycleError> {
        let event = LifecycleEvent::from_str(event)
            .map_err(|_| LifecycleError::UnknownEvent(event.to_string()))?;
        Ok(self.on_event(event, hook))
    }

    /// Build the axum [`Router`] serving this application
    ///
    /// Includes the docs endpoint (when enabled) and every mounted
    /// sub-application. Can be called repeatedly.
    pub fn router(&self) -> Router {
        let mut router = self.router.clone();

        let docs_url = self.openapi_url.as_deref().filter(|url| {
            let taken = self.routes.iter().any(|route| route.path == *url);
            if taken {
                tracing::warn!(
                    app = %self.id,
                    "Route {} already registered, docs document not served",
                    url
                );
            }
            !taken
        });

        if let Some(url) = docs_url {
            let document = OpenApiDocument::new(&self.title, &self.version, &self.routes);
            match serde_json::to_value(document) {
                Ok(document) => {
                    router = router.route(
                        url,
                        routing::get(move || {
                            let document = document.clone();
                            async move { Json(document) }
                        }),
                    );
                }
                Err(e) => tracing::error!("Failed to serialize docs document: {}", e),
            }
        }

        if !self.mounts.is_empty() {
            let mounts = self
                .mounts
                .iter()
                .map(|(prefix, app)| MountPoint {
                    prefix: prefix.clone(),
                    router: app.router(),
                })
                .collect();
            router = router.fallback_service(MountService::new(mounts));
        }

        router
    }

    /// Run the startup hooks. Calls after a successful startup do nothing.
    pub async fn startup(&self) -> Result<(), LifecycleError> {
        self.lifecycle.call_startup().await
    }

    /// Run the shutdown hooks. Subsequent calls do nothing.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.lifecycle.call_shutdown().await
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn serve(&self, listener: TcpListener) -> crate::Result<()> {
        self.serve_with_shutdown(listener, async {
            shutdown_signal().await;
        })
        .await
    }

    /// Serve until `signal` completes
    ///
    /// Startup hooks run before the listener accepts requests, shutdown hooks
    /// run after the server drained. A startup failure aborts before serving.
    pub async fn serve_with_shutdown<F>(&self, listener: TcpListener, signal: F) -> crate::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.startup().await?;

        let addr = listener.local_addr()?;
        tracing::info!(app = %self.id, "Serving {} on http://{}", self.title, addr);

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await;

        tracing::info!(app = %self.id, "Server stopped");
        self.shutdown().await?;
        served?;
        Ok(())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("root_path", &self.root_path)
            .field("openapi_url", &self.openapi_url)
            .field("routes", &self.routes)
            .field("mounts", &self.mounts.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("startup_hooks", self.startup_hooks())
            .field("shutdown_hooks", self.shutdown_hooks())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::hook_fn;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_docs_endpoint_lists_routes() {
        let app = Application::builder()
            .title("Docs")
            .version("2.0.0")
            .build()
            .get("/", || async { "root" })
            .post("/items", || async { "created" });

        let (status, body) = get(app.router(), "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);

        let doc: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["info"], json!({ "title": "Docs", "version": "2.0.0" }));
        assert_eq!(doc["paths"], json!({ "/": { "get": {} }, "/items": { "post": {} } }));
    }

    #[tokio::test]
    async fn test_docs_can_be_disabled() {
        let app = Application::builder().without_docs().build();
        assert_eq!(app.openapi_url(), None);

        let (status, _) = get(app.router(), "/openapi.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relative_docs_url() {
        let app = Application::builder().openapi_url("docs.json").build();

        let (status, body) = get(app.router(), "/docs.json").await;
        assert_eq!(status, StatusCode::OK);
        let doc: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["openapi"], "3.1.0");
    }

    #[tokio::test]
    async fn test_user_route_at_docs_url_wins() {
        let app = Application::new().get("/openapi.json", || async { "custom" });

        let (status, body) = get(app.router(), "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"custom");
    }

    #[tokio::test]
    async fn test_mounted_application_receives_stripped_paths() {
        let admin = Application::new().get("/users", || async { "admin users" });
        let app = Application::new()
            .get("/", || async { "home" })
            .mount("/admin/", admin);

        assert_eq!(app.mounts().map(|(p, _)| p).collect::<Vec<_>>(), vec!["/admin"]);
        assert_eq!(get(app.router(), "/").await.1, b"home");
        assert_eq!(get(app.router(), "/admin/users").await.1, b"admin users");
        assert_eq!(get(app.router(), "/missing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mounted_hooks_are_not_run_by_parent() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let child = Application::new().on_startup(hook_fn("child", move || {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        }));

        let parent = Application::new().mount("/child", child);
        parent.startup().await.unwrap();

        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_add_event_handler() {
        let app = Application::new()
            .add_event_handler("startup", hook_fn("a", || async { Ok(()) }))
            .unwrap()
            .add_event_handler("shutdown", hook_fn("b", || async { Ok(()) }))
            .unwrap();

        assert_eq!(app.startup_hooks().names(), vec!["a"]);
        assert_eq!(app.shutdown_hooks().names(), vec!["b"]);

        let err = Application::new()
            .add_event_handler("reload", hook_fn("c", || async { Ok(()) }))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownEvent(ref name) if name == "reload"));
    }

    #[test]
    fn test_instances_are_distinct() {
        let a = Application::new();
        let b = Application::new();
        assert_ne!(a.id(), b.id());
        assert!(!a.state().ptr_eq(b.state()));
    }

    #[tokio::test]
    async fn test_serve_runs_hooks_around_requests() {
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let (on_start, on_stop) = (Arc::clone(&started), Arc::clone(&stopped));

        let app = Arc::new(
            Application::new()
                .get("/", || async { "served" })
                .on_startup(hook_fn("start", move || {
                    let flag = Arc::clone(&on_start);
                    async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                }))
                .on_shutdown(hook_fn("stop", move || {
                    let flag = Arc::clone(&on_stop);
                    async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                })),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn({
            let app = Arc::clone(&app);
            async move {
                app.serve_with_shutdown(listener, async {
                    let _ = rx.await;
                })
                .await
            }
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("served"));
        assert!(started.load(Ordering::SeqCst));
        assert!(!stopped.load(Ordering::SeqCst));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_serve_aborts_when_startup_fails() {
        let app = Application::new().on_startup(hook_fn("broken", || async {
            anyhow::bail!("no database")
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let err = app
            .serve_with_shutdown(listener, std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::PyramidionError::Lifecycle(LifecycleError::HookFailed { .. })
        ));
        assert!(!app.lifecycle().has_stopped());
    }
}
