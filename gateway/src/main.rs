use axum::{routing::get, Json, Router};
use dotenvy::dotenv;
use scoreline_core::{urls, AppConfig, AppState};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Health { ok: bool, service: &'static str }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let port: u16 = std::env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(3000);

    let state = AppState { cfg: AppConfig::from_env() };
    info!("serving branch data from {}", state.cfg.data_dir.display());

    let app = Router::new()
        .route("/healthz", get(|| async { Json(Health { ok: true, service: "scoreline-gateway" }) }))
        .nest("/api", urls::router())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
