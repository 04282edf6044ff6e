pub mod handlers;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::view::QueryEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

pub fn router(engine: Arc<QueryEngine>) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/filters", get(handlers::filters))
        .route("/api/v1/dashboard", get(handlers::dashboard))
        .route("/api/v1/transactions", get(handlers::list_transactions))
        .route(
            "/api/v1/transactions/export",
            get(handlers::export_transactions),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(engine: Arc<QueryEngine>, host: &str, port: u16) -> eyre::Result<()> {
    let app = router(engine);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
