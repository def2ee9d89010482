// src/api/mod.rs — HTTP surface the chat front-end talks to

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::core::orchestrator::Orchestrator;
use crate::infra::config::ServerConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::tts_stream))
        .route("/tts", post(handlers::tts_stream))
        .route("/srt", post(handlers::tts_file))
        .route("/srt/{file}", get(handlers::get_output_file))
        .route("/speakers", get(handlers::speakers))
        .route("/speakers_list", get(handlers::speakers_list))
        // Browser front-ends call from arbitrary origins
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
