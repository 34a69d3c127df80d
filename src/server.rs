use std::{net::SocketAddr, time::Instant};

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{analysis, log_info, notes, AppState};

const ENABLE_LOGS: bool = true;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(analysis::routes::router())
        .merge(notes::routes::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    log_info!(
        "{method} {path} -> {} ({} ms)",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

pub async fn serve(state: AppState, addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
    serve_listener(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled, then
/// let in-flight requests finish.
pub async fn serve_listener(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("failed to read listener address")?;
    log_info!("API server is running on http://{local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    log_info!("API server stopped");
    Ok(())
}
