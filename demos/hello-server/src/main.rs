use pyramidion::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const VISITS_KEY: &str = "visits";

async fn hello() -> Json<serde_json::Value> {
    Json(json!({ "detail": { "msg": "hello world!" } }))
}

#[pyramidion]
fn create_app(config: &ServerConfig) -> Application {
    let app = Application::builder()
        .title("Hello Server")
        .root_path("/hello")
        .with_server_config(config)
        .build();

    let visits = app.state().clone();
    visits.insert(VISITS_KEY, AtomicU64::new(0));
    let on_stop = visits.clone();

    app.get("/", hello)
        .get("/visits", move || {
            let visits = visits.clone();
            async move {
                let count = visits
                    .get::<AtomicU64>(VISITS_KEY)
                    .map(|c| c.fetch_add(1, Ordering::SeqCst) + 1)
                    .unwrap_or_default();
                Json(json!({ "visits": count }))
            }
        })
        .on_startup(hook_fn("greet", || async {
            tracing::info!("👋 Hello server is warming up");
            Ok(())
        }))
        .on_shutdown(hook_fn("report-visits", move || {
            let visits = on_stop.clone();
            async move {
                let count = visits
                    .get::<AtomicU64>(VISITS_KEY)
                    .map(|c| c.load(Ordering::SeqCst))
                    .unwrap_or_default();
                tracing::info!("Served {} visits", count);
                Ok(())
            }
        }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("🚀 Starting Hello Server...");

    let config = ServerConfig::from_env()?;
    let app = create_app(&config);

    if let Some(base) = base_application(&app) {
        tracing::info!(
            "Mounted {} under {}",
            base.title(),
            base.root_path().unwrap_or("/")
        );
    }

    app.startup().await?;

    let router = app.router().layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.addr()?).await?;
    tracing::info!("✅ Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("🛑 Initiating graceful shutdown...");
        })
        .await?;

    app.shutdown().await?;
    tracing::info!("👋 Server stopped");
    Ok(())
}
