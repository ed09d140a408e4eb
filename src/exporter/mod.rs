//! HTTP server wiring.

pub mod handler;
pub mod timeout;

use crate::collectors::ScraperType;
use crate::config::ConfigHandler;
use anyhow::Result;
use axum::Router;
use axum::routing::{get, post};
use handler::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router and serve until the process is stopped.
///
/// With no `listen` address the listener binds IPv6 (dual-stack where the
/// platform allows it) and falls back to IPv4.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn new(
    port: u16,
    listen: Option<String>,
    config: ConfigHandler,
    scrapers: Vec<ScraperType>,
    timeout_offset: f64,
    metrics_path: String,
) -> Result<()> {
    let state = Arc::new(AppState {
        config,
        scrapers,
        timeout_offset,
        metrics_path: metrics_path.clone(),
    });

    let mut app = Router::new()
        .route(&metrics_path, get(handler::metrics))
        .route("/probe", get(handler::metrics))
        .route("/-/reload", post(handler::reload));

    if metrics_path != "/" && !metrics_path.is_empty() {
        app = app.route("/", get(handler::landing));
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = bind(port, listen).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn bind(port: u16, listen: Option<String>) -> Result<TcpListener> {
    match listen {
        Some(address) => Ok(TcpListener::bind((address.as_str(), port)).await?),
        None => match TcpListener::bind(("::", port)).await {
            Ok(listener) => Ok(listener),
            Err(_) => Ok(TcpListener::bind(("0.0.0.0", port)).await?),
        },
    }
}
