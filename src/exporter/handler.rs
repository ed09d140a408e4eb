//! Request handlers: metric scrapes, ad-hoc probes, and config reload.

use crate::collectors::{Exporter, MetricSink, ScraperType, filter_scrapers};
use crate::config::ConfigHandler;
use crate::exporter::timeout::scrape_timeout;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::{error, warn};

const TIMEOUT_HEADER: &str = "X-Prometheus-Scrape-Timeout-Seconds";

/// Read-only request-serving state; the credential snapshot inside
/// `ConfigHandler` is the only piece that changes, atomically, on reload.
pub struct AppState {
    pub config: ConfigHandler,
    pub scrapers: Vec<ScraperType>,
    pub timeout_offset: f64,
    pub metrics_path: String,
}

/// Serve one scrape. Also mounted on `/probe` for ad-hoc target probing.
///
/// Query parameters: `target` overrides the configured host/port,
/// repeated `collect[]` narrows the scraper set.
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let target = params
        .iter()
        .find(|(key, _)| key == "target")
        .map(|(_, value)| value.as_str());
    let collect: Vec<String> = params
        .iter()
        .filter(|(key, _)| key == "collect[]")
        .map(|(_, value)| value.clone())
        .collect();

    let client = state.config.client();
    let opts = match client.connect_options(target) {
        Ok(opts) => opts,
        Err(e) => {
            error!(error = %e, "failed to form connection options from [client] config");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error forming target connection: {e}"),
            )
                .into_response();
        }
    };

    let header = headers.get(TIMEOUT_HEADER).and_then(|v| v.to_str().ok());
    let timeout = match scrape_timeout(header, state.timeout_offset) {
        Ok(timeout) => timeout,
        Err(e) => {
            // Fail open: scrape without the derived deadline.
            warn!(error = %e, "error getting timeout from Prometheus header");
            None
        }
    };

    let scrapers = filter_scrapers(&state.scrapers, &collect);

    let sink = MetricSink::new();
    Exporter::new(opts, scrapers).scrape(timeout, &sink).await;

    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&sink.gather(), &mut buf) {
        error!(error = %e, "failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "error encoding metrics".to_string(),
        )
            .into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type())], buf).into_response()
}

/// Re-read the credential file. A failed reload is logged and leaves the
/// previous snapshot in effect; the caller always gets a 200.
#[allow(clippy::unused_async)]
pub async fn reload(State(state): State<Arc<AppState>>) -> Response {
    match state.config.reload() {
        Ok(()) => "ok".into_response(),
        Err(e) => {
            warn!(error = %e, "error reloading client config");
            StatusCode::OK.into_response()
        }
    }
}

#[allow(clippy::unused_async)]
pub async fn landing(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\
         <head><title>MySQLd Exporter</title></head>\
         <body>\
         <h1>MySQLd Exporter</h1>\
         <p>Prometheus Exporter for MySQL servers</p>\
         <p><a href=\"{}\">Metrics</a></p>\
         </body>\
         </html>",
        state.metrics_path
    ))
}
