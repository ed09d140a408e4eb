//! Per-request scrape orchestration.
//!
//! One `Exporter` drives one scrape: it establishes the shared connection
//! handle, fans the selected scrapers out over it, and turns each scraper's
//! outcome into a success gauge and a log line. A scraper failure never
//! aborts its siblings, and an expired deadline still leaves every metric
//! collected so far in the sink.

use crate::collectors::{Instance, MetricSink, ScrapeError, Scraper, ScraperType};
use futures::stream::{FuturesUnordered, StreamExt};
use sqlx::mysql::MySqlConnectOptions;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const UP: &str = "mysql_up";
const UP_HELP: &str = "Whether the MySQL server is up.";

const VERSION_INFO: &str = "mysql_version_info";
const VERSION_INFO_HELP: &str = "MySQL server version and variant.";

const COLLECTOR_DURATION: &str = "mysql_exporter_collector_duration_seconds";
const COLLECTOR_DURATION_HELP: &str = "Collector time duration.";

const COLLECTOR_SUCCESS: &str = "mysql_exporter_collector_success";
const COLLECTOR_SUCCESS_HELP: &str = "Whether the collector succeeded.";

const SCRAPE_DURATION: &str = "mysql_exporter_scrape_duration_seconds";
const SCRAPE_DURATION_HELP: &str = "Total time the scrape took.";

/// Result of one scraper run within one request.
pub struct ScrapeOutcome {
    pub name: &'static str,
    pub result: Result<(), ScrapeError>,
    pub elapsed: Duration,
}

/// Orchestrates one scrape against one target.
pub struct Exporter {
    opts: MySqlConnectOptions,
    scrapers: Vec<ScraperType>,
}

impl Exporter {
    #[must_use]
    pub fn new(opts: MySqlConnectOptions, scrapers: Vec<ScraperType>) -> Self {
        Self { opts, scrapers }
    }

    /// Run the scrape, writing every metric into `sink`.
    ///
    /// If the connection cannot be established the sink ends up with exactly
    /// one metric (`mysql_up 0`) and no scraper runs. Scraper failures and
    /// deadline expiry are recorded per scraper and never abort the scrape.
    pub async fn scrape(&self, timeout: Option<Duration>, sink: &MetricSink) {
        let start = Instant::now();
        let deadline = timeout.map(|t| start + t);

        let instance = match with_deadline(deadline, Instance::connect(self.opts.clone())).await {
            Ok(instance) => instance,
            Err(e) => {
                warn!(error = %e, "error pinging mysqld");
                emit_gauge(sink, UP, UP_HELP, &[], &[], 0.0);
                return;
            }
        };

        emit_gauge(sink, UP, UP_HELP, &[], &[], 1.0);
        emit_gauge(
            sink,
            VERSION_INFO,
            VERSION_INFO_HELP,
            &["version", "variant"],
            &[instance.version_string(), instance.variant().as_str()],
            1.0,
        );

        let scrapers: Vec<&dyn Scraper> = self.scrapers.iter().map(|s| s as &dyn Scraper).collect();
        let outcomes = run_scrapers(&instance, &scrapers, deadline, sink).await;
        record_outcomes(sink, &outcomes);

        emit_gauge(
            sink,
            SCRAPE_DURATION,
            SCRAPE_DURATION_HELP,
            &[],
            &[],
            start.elapsed().as_secs_f64(),
        );
    }
}

/// Fan the scrapers out over the shared handle and join them all.
///
/// Scrapers whose minimum server version exceeds the detected one are
/// skipped entirely (no outcome). Every started scraper yields exactly one
/// outcome, deadline expiry included.
pub(crate) async fn run_scrapers(
    instance: &Instance,
    scrapers: &[&dyn Scraper],
    deadline: Option<Instant>,
    sink: &MetricSink,
) -> Vec<ScrapeOutcome> {
    let mut tasks = FuturesUnordered::new();

    for scraper in scrapers {
        if instance.version() < scraper.version() {
            debug!(
                collector = scraper.name(),
                server_version = instance.version(),
                minimum_version = scraper.version(),
                "skipping collector, server version too old"
            );
            continue;
        }

        tasks.push(async move {
            let started = Instant::now();
            let result = with_deadline(deadline, scraper.scrape(instance, sink)).await;

            ScrapeOutcome {
                name: scraper.name(),
                result,
                elapsed: started.elapsed(),
            }
        });
    }

    let mut outcomes = Vec::with_capacity(scrapers.len());
    while let Some(outcome) = tasks.next().await {
        outcomes.push(outcome);
    }

    outcomes
}

/// Turn each outcome into its success gauge, duration gauge, and log line.
pub(crate) fn record_outcomes(sink: &MetricSink, outcomes: &[ScrapeOutcome]) {
    for outcome in outcomes {
        let success = match &outcome.result {
            Ok(()) => {
                debug!(collector = outcome.name, "collector succeeded");
                1.0
            }
            Err(e) if e.is_cancellation() => {
                warn!(collector = outcome.name, "collector aborted by scrape deadline");
                0.0
            }
            Err(e) => {
                warn!(collector = outcome.name, error = %e, "error from collector");
                0.0
            }
        };

        emit_gauge(
            sink,
            COLLECTOR_SUCCESS,
            COLLECTOR_SUCCESS_HELP,
            &["collector"],
            &[outcome.name],
            success,
        );
        emit_gauge(
            sink,
            COLLECTOR_DURATION,
            COLLECTOR_DURATION_HELP,
            &["collector"],
            &[outcome.name],
            outcome.elapsed.as_secs_f64(),
        );
    }
}

async fn with_deadline<T, F>(deadline: Option<Instant>, fut: F) -> Result<T, ScrapeError>
where
    F: Future<Output = Result<T, ScrapeError>>,
{
    match deadline {
        Some(deadline) => (tokio::time::timeout_at(deadline, fut).await)
            .unwrap_or(Err(ScrapeError::DeadlineExceeded)),
        None => fut.await,
    }
}

fn emit_gauge(
    sink: &MetricSink,
    name: &str,
    help: &str,
    labels: &[&str],
    values: &[&str],
    value: f64,
) {
    if let Err(e) = sink.gauge(name, help, labels, values, value) {
        warn!(metric = name, error = %e, "failed to emit metric");
    }
}
