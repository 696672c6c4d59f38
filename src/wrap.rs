//! Root-path wrapping
//!
//! An application built with a root path (say `/api`) expects a proxy in
//! front of it to strip that prefix. [`wrap_application`] makes it servable on
//! its own instead: the application is mounted at its root path on a fresh
//! outer application, its lifecycle hooks are forwarded, and `GET /` answers
//! with a `301 Moved Permanently` pointing at the root path.
//!
//! [`pyramidion`] and [`try_pyramidion`] apply this to a factory function; the
//! `#[pyramidion]` attribute does the same for a factory written as a plain
//! `fn`.

use crate::application::Application;
use axum::http::{StatusCode, header};
use std::sync::Arc;

/// Extension state key under which the outer application keeps the base one
pub const STATE_KEY: &str = "pyramidion";

/// Wrap `base` if it declares a root path, otherwise return it untouched
///
/// The outer application has no docs endpoint, shares snapshots of the base
/// application's startup and shutdown hook lists, and stores the base
/// application under [`STATE_KEY`].
///
/// ```
/// use pyramidion::{Application, base_application, wrap_application};
///
/// let plain = wrap_application(Application::new());
/// assert!(base_application(&plain).is_none());
///
/// let wrapped = wrap_application(Application::builder().root_path("/test").build());
/// assert_eq!(wrapped.root_path(), None);
/// assert_eq!(base_application(&wrapped).unwrap().root_path(), Some("/test"));
/// ```
pub fn wrap_application(base: Application) -> Application {
    let Some(root_path) = base.root_path().map(str::to_owned) else {
        tracing::debug!(app = %base.id(), "No root path, serving application as is");
        return base;
    };

    let mut builder = Application::builder()
        .title(base.title())
        .version(base.version())
        .without_docs()
        .on_startup(base.startup_hooks().clone())
        .on_shutdown(base.shutdown_hooks().clone());
    if let Some(timeout) = base.lifecycle().startup_timeout() {
        builder = builder.startup_timeout(timeout);
    }
    if let Some(timeout) = base.lifecycle().shutdown_timeout() {
        builder = builder.shutdown_timeout(timeout);
    }
    let outer = builder.build();

    let base = Arc::new(base);
    outer.state().insert_arc(STATE_KEY, Arc::clone(&base));

    tracing::info!(
        root_path = %root_path,
        base = %base.id(),
        outer = %outer.id(),
        startup_hooks = outer.startup_hooks().len(),
        shutdown_hooks = outer.shutdown_hooks().len(),
        "Mounting application under its root path"
    );

    let location = root_path.clone();
    outer.mount(&root_path, base).get("/", move || {
        let location = location.clone();
        async move { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]) }
    })
}

/// The base application stored by [`wrap_application`], if `app` is an outer one
pub fn base_application(app: &Application) -> Option<Arc<Application>> {
    app.state().get::<Application>(STATE_KEY)
}

/// Turn an application factory into one that wraps its output
///
/// Arguments pass through unchanged: use `()` for a factory without
/// arguments and a tuple for several.
///
/// ```
/// use pyramidion::{Application, pyramidion};
///
/// let create_app = pyramidion(|prefix: &str| Application::builder().root_path(prefix).build());
///
/// assert!(create_app("/v1").state().contains("pyramidion"));
/// assert!(!create_app("").state().contains("pyramidion"));
/// ```
pub fn pyramidion<F, Args>(factory: F) -> impl Fn(Args) -> Application
where
    F: Fn(Args) -> Application,
{
    move |args| wrap_application(factory(args))
}

/// Like [`pyramidion`] for factories that can fail
///
/// Factory errors are returned unchanged.
pub fn try_pyramidion<F, Args, E>(factory: F) -> impl Fn(Args) -> Result<Application, E>
where
    F: Fn(Args) -> Result<Application, E>,
{
    move |args| factory(args).map(wrap_application)
}

#[doc(hidden)]
pub mod __private {
    use std::future::Future;

    /// Pins the output type of an async factory body for `#[pyramidion]`
    pub fn factory_future<T, F>(future: F) -> F
    where
        F: Future<Output = T>,
    {
        future
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::hook_fn;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Json;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn root() -> Json<Value> {
        Json(json!({ "detail": { "msg": "hello world!" } }))
    }

    fn create_app(root_path: &str) -> Application {
        Application::builder()
            .root_path(root_path)
            .build()
            .get("/", root)
    }

    async fn send(router: Router, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_base_app_without_root_path() {
        let factory = pyramidion(|()| create_app(""));
        let app = factory(());

        assert!(!app.state().contains(STATE_KEY));
        assert!(app.state().is_empty());

        let response = send(app.router(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": { "msg": "hello world!" } })
        );
    }

    #[test]
    fn test_passthrough_returns_same_instance() {
        let base = create_app("");
        let id = base.id();
        let state = base.state().clone();

        let app = wrap_application(base);
        assert_eq!(app.id(), id);
        assert!(app.state().ptr_eq(&state));
        assert_eq!(app.openapi_url(), Some("/openapi.json"));
    }

    #[tokio::test]
    async fn test_root_redirects_to_root_path() {
        let app = pyramidion(|()| create_app("/test"))(());
        assert!(app.state().contains(STATE_KEY));

        let response = send(app.router(), "/").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/test");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());

        let response = send(app.router(), "/test/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": { "msg": "hello world!" } })
        );
    }

    #[tokio::test]
    async fn test_mounted_response_matches_base() {
        let app = wrap_application(create_app("/test"));
        let base = base_application(&app).unwrap();

        let direct = body_json(send(base.router(), "/").await).await;
        let mounted = body_json(send(app.router(), "/test/").await).await;
        assert_eq!(direct, mounted);

        let response = send(app.router(), "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_only_paths_under_root_path_are_delegated() {
        let app = wrap_application(create_app("/test"));

        assert_eq!(send(app.router(), "/testing").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(app.router(), "/other/").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docs_only_on_base() {
        let app = wrap_application(create_app("/test"));
        assert_eq!(app.openapi_url(), None);

        assert_eq!(
            send(app.router(), "/openapi.json").await.status(),
            StatusCode::NOT_FOUND
        );

        let response = send(app.router(), "/test/openapi.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["paths"], json!({ "/": { "get": {} } }));
    }

    #[test]
    fn test_back_reference_is_the_base_instance() {
        let base = create_app("/test");
        let id = base.id();
        let state = base.state().clone();

        let app = wrap_application(base);
        let stored = base_application(&app).unwrap();

        assert_eq!(stored.id(), id);
        assert!(stored.state().ptr_eq(&state));
        assert_ne!(app.id(), id);

        assert!(stored.state().is_empty());
        assert_eq!(stored.root_path(), Some("/test"));
        assert_eq!(stored.openapi_url(), Some("/openapi.json"));
        assert_eq!(stored.mounts().count(), 0);
        assert_eq!(stored.routes().len(), 1);

        let (prefix, mounted) = app.mounts().next().unwrap();
        assert_eq!(prefix, "/test");
        assert!(Arc::ptr_eq(mounted, &stored));
    }

    #[tokio::test]
    async fn test_lifespan_is_forwarded() {
        let app = pyramidion(|()| {
            let base = create_app("/test");
            let state = base.state().clone();
            state.insert("startup_called", AtomicBool::new(false));
            state.insert("shutdown_called", AtomicBool::new(false));

            let on_start = state.clone();
            let on_stop = state.clone();
            base.on_startup(hook_fn("startup", move || {
                let state = on_start.clone();
                async move {
                    if let Some(flag) = state.get::<AtomicBool>("startup_called") {
                        flag.store(true, Ordering::SeqCst);
                    }
                    Ok(())
                }
            }))
            .on_shutdown(hook_fn("shutdown", move || {
                let state = on_stop.clone();
                async move {
                    if let Some(flag) = state.get::<AtomicBool>("shutdown_called") {
                        flag.store(true, Ordering::SeqCst);
                    }
                    Ok(())
                }
            }))
        })(());

        let base = base_application(&app).unwrap();
        let flag = |key: &str| {
            base.state()
                .get::<AtomicBool>(key)
                .unwrap()
                .load(Ordering::SeqCst)
        };
        assert!(!flag("startup_called"));
        assert!(!flag("shutdown_called"));

        app.startup().await.unwrap();
        assert!(flag("startup_called"));
        assert!(!flag("shutdown_called"));

        let response = send(app.router(), "/test/").await;
        assert_eq!(response.status(), StatusCode::OK);

        app.shutdown().await.unwrap();
        assert!(flag("startup_called"));
        assert!(flag("shutdown_called"));
    }

    #[tokio::test]
    async fn test_hooks_run_once_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let hook = |name: &'static str| {
            let order = Arc::clone(&order);
            hook_fn(name, move || {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(name);
                    Ok(())
                }
            })
        };

        let app = wrap_application(
            create_app("/test")
                .on_startup(hook("first"))
                .on_startup(hook("second"))
                .on_shutdown(hook("last")),
        );
        assert_eq!(app.startup_hooks().names(), vec!["first", "second"]);

        app.startup().await.unwrap();
        app.startup().await.unwrap();
        app.shutdown().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "last"]);
    }

    #[test]
    fn test_each_call_builds_independent_pair() {
        let calls = AtomicUsize::new(0);
        let factory = pyramidion(|()| {
            calls.fetch_add(1, Ordering::SeqCst);
            create_app("/test")
        });

        let first = factory(());
        let second = factory(());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(first.id(), second.id());
        assert_ne!(
            base_application(&first).unwrap().id(),
            base_application(&second).unwrap().id()
        );
    }

    #[test]
    fn test_factory_arguments_pass_through() {
        let factory = pyramidion(|(title, root_path): (&str, &str)| {
            Application::builder().title(title).root_path(root_path).build()
        });

        let app = factory(("Inventory", "/inventory"));
        assert_eq!(app.title(), "Inventory");
        assert_eq!(
            base_application(&app).unwrap().root_path(),
            Some("/inventory")
        );
    }

    #[test]
    fn test_factory_errors_propagate_unchanged() {
        #[derive(Debug, PartialEq)]
        struct MissingDatabaseUrl;

        let factory = try_pyramidion(|fail: bool| {
            if fail {
                Err(MissingDatabaseUrl)
            } else {
                Ok(create_app("/test"))
            }
        });

        assert_eq!(factory(true).unwrap_err(), MissingDatabaseUrl);
        assert!(factory(false).unwrap().state().contains(STATE_KEY));
    }

    #[test]
    fn test_attribute_on_sync_factory() {
        #[crate::pyramidion]
        fn create(root_path: &str, title: &str) -> Application {
            Application::builder().root_path(root_path).title(title).build()
        }

        let app = create("/test", "Attr");
        assert_eq!(base_application(&app).unwrap().title(), "Attr");
        assert!(!create("", "Attr").state().contains(STATE_KEY));
    }

    #[test]
    fn test_attribute_on_fallible_factory() {
        #[crate::pyramidion]
        fn create(port: &str) -> Result<Application, std::num::ParseIntError> {
            let port: u16 = port.parse()?;
            Ok(Application::builder()
                .root_path(format!("/port-{}", port))
                .build())
        }

        assert!(create("eighty").is_err());
        let app = create("80").unwrap();
        assert_eq!(base_application(&app).unwrap().root_path(), Some("/port-80"));
    }

    #[tokio::test]
    async fn test_attribute_on_async_factory() {
        #[crate::pyramidion]
        async fn create() -> anyhow::Result<Application> {
            tokio::task::yield_now().await;
            Ok(create_app("/async"))
        }

        let app = create().await.unwrap();
        let response = send(app.router(), "/").await;
        assert_eq!(response.headers()[header::LOCATION], "/async");
    }
}
