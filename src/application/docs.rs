use serde::Serialize;
use std::collections::BTreeMap;

const OPENAPI_VERSION: &str = "3.1.0";

/// A registered route as shown in the docs document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    /// Lowercase method name, `None` for routes added with `Application::route`
    pub method: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenApiDocument {
    openapi: &'static str,
    info: Info,
    paths: BTreeMap<String, BTreeMap<String, Operation>>,
}

#[derive(Debug, Serialize)]
struct Info {
    title: String,
    version: String,
}

#[derive(Debug, Default, Serialize)]
struct Operation {}

impl OpenApiDocument {
    pub(crate) fn new(title: &str, version: &str, routes: &[RouteInfo]) -> Self {
        let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
        for route in routes {
            let operations = paths.entry(route.path.clone()).or_default();
            if let Some(method) = &route.method {
                operations.insert(method.clone(), Operation::default());
            }
        }

        Self {
            openapi: OPENAPI_VERSION,
            info: Info {
                title: title.to_string(),
                version: version.to_string(),
            },
            paths,
        }
    }
}
