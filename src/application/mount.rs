//! Sub-application mounting
//!
//! A tower [`Service`] that dispatches requests into mounted routers with the
//! mount prefix stripped from the path.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, Uri, uri::PathAndQuery},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

/// Prefix under which the current request was dispatched
///
/// Inserted as a request extension, so handlers inside a mounted application
/// can rebuild absolute URLs. Nested mounts accumulate.
///
/// ```rust,ignore
/// async fn handler(Extension(prefix): Extension<MountedPrefix>) -> String {
///     format!("mounted at {}", prefix.as_str())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedPrefix(pub String);

impl MountedPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub(crate) struct MountPoint {
    pub(crate) prefix: String,
    pub(crate) router: Router,
}

impl MountPoint {
    /// The path left after removing this mount's prefix, if the request belongs here
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Dispatches requests to the mount with the longest matching prefix
///
/// Requests matching no mount get an empty `404 Not Found`.
#[derive(Clone)]
pub(crate) struct MountService {
    mounts: Arc<[MountPoint]>,
}

impl MountService {
    pub(crate) fn new(mut mounts: Vec<MountPoint>) -> Self {
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self {
            mounts: mounts.into(),
        }
    }

    fn resolve<'a>(&self, path: &'a str) -> Option<(&MountPoint, &'a str)> {
        self.mounts
            .iter()
            .find_map(|mount| mount.strip(path).map(|rest| (mount, rest)))
    }
}

fn rewrite_uri(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

impl Service<Request<Body>> for MountService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let Some((mount, rest)) = self.resolve(request.uri().path()) else {
            return Box::pin(async { Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response()) });
        };

        let Some(uri) = rewrite_uri(request.uri(), rest) else {
            tracing::warn!("Could not rewrite {} for mount {}", request.uri(), mount.prefix);
            return Box::pin(async { Ok::<_, Infallible>(StatusCode::BAD_REQUEST.into_response()) });
        };

        tracing::trace!("Dispatching {} into mount {} as {}", request.uri(), mount.prefix, uri);

        let prefix = match request.extensions().get::<MountedPrefix>() {
            Some(outer) => format!("{}{}", outer.0, mount.prefix),
            None => mount.prefix.clone(),
        };
        *request.uri_mut() = uri;
        request.extensions_mut().insert(MountedPrefix(prefix));

        let router = mount.router.clone();
        Box::pin(async move { router.oneshot(request).await })
    }
}
