//! Replication status scraper.
//!
//! The status command and its column set differ between server families and
//! versions: `MariaDB` multi-source setups answer `SHOW ALL SLAVES STATUS`,
//! `MySQL` and Percona answer `SHOW SLAVE STATUS` (with optional lock-hint
//! suffixes), and recent `MySQL` renames the whole surface to
//! `SHOW REPLICA STATUS`. Candidates are tried in a fixed priority order and
//! the first one that executes wins; the resulting columns are mapped into
//! metrics by name, so their order and membership never matter.

use crate::collectors::{
    Instance, MetricSink, NAMESPACE, NamedRow, ScrapeError, Scraper,
};
use futures::future::BoxFuture;
use tracing::info_span;
use tracing_futures::Instrument as _;

const SUBSYSTEM: &str = "slave_status";

/// Status query variants, most specific family first.
const STATUS_QUERIES: [&str; 3] = [
    "SHOW ALL SLAVES STATUS",
    "SHOW SLAVE STATUS",
    "SHOW REPLICA STATUS",
];

/// Lock-hint suffixes for the dominant `SHOW SLAVE STATUS` family, most
/// permissive first. The empty suffix is the plain statement.
const LOCK_HINT_SUFFIXES: [&str; 3] = [" NONBLOCKING", " NOLOCK", ""];

const DOMINANT_QUERY: &str = "SHOW SLAVE STATUS";

const LABELS: [&str; 4] = ["master_host", "master_uuid", "channel_name", "connection_name"];

/// Columns holding comma-separated `<domain>-<server>-<sequence>` positions.
const GTID_COLUMNS: [&str; 2] = ["Gtid_IO_Pos", "Gtid_Slave_Pos"];

/// Collects from the server's replication status command.
#[derive(Clone, Copy, Default)]
pub struct SlaveStatus;

impl SlaveStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scraper for SlaveStatus {
    fn name(&self) -> &'static str {
        "slave_status"
    }

    fn help(&self) -> &'static str {
        "Collect from SHOW SLAVE STATUS"
    }

    fn version(&self) -> f64 {
        5.1
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    fn scrape<'a>(
        &'a self,
        instance: &'a Instance,
        sink: &'a MetricSink,
    ) -> BoxFuture<'a, Result<(), ScrapeError>> {
        Box::pin(async move {
            let pool = instance.pool();
            let rows = resolve_status_rows(|query: String| async move {
                let span = info_span!(
                    "db.query",
                    db.system = "mysql",
                    db.operation = "SHOW",
                    db.statement = %query,
                    otel.kind = "client"
                );

                let rows = sqlx::query(&query)
                    .fetch_all(pool)
                    .instrument(span)
                    .await
                    .map_err(ScrapeError::from)?;

                let rows: Vec<NamedRow> = rows.iter().map(NamedRow::from_mysql).collect();
                Ok(rows)
            })
            .await?;

            for row in &rows {
                emit_status_row(sink, row)?;
            }

            Ok(())
        })
    }
}

/// The full candidate list in priority order: each variant expands to its
/// suffixed forms when it belongs to the dominant family.
pub(crate) fn candidate_queries() -> Vec<String> {
    let mut candidates = Vec::new();

    for query in STATUS_QUERIES {
        if query == DOMINANT_QUERY {
            for suffix in LOCK_HINT_SUFFIXES {
                candidates.push(format!("{query}{suffix}"));
            }
        } else {
            candidates.push(query.to_string());
        }
    }

    candidates
}

/// Run candidates in priority order and stop at the first one that executes
/// without error. Zero rows is still success: a server that is not a replica
/// answers the query with an empty set.
///
/// # Errors
///
/// Returns `DialectExhausted` carrying the last error when every candidate
/// fails.
pub(crate) async fn resolve_status_rows<F, Fut>(mut query: F) -> Result<Vec<NamedRow>, ScrapeError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<NamedRow>, ScrapeError>>,
{
    let mut last_error = None;

    for candidate in candidate_queries() {
        match query(candidate).await {
            Ok(rows) => return Ok(rows),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map_or_else(
        || ScrapeError::Query(sqlx::Error::Protocol("no status query candidates".into())),
        |e| ScrapeError::DialectExhausted(Box::new(e)),
    ))
}

/// Map one status row onto metrics: a generic untyped metric per numeric
/// column, plus per-position gauges for the GTID columns.
pub(crate) fn emit_status_row(sink: &MetricSink, row: &NamedRow) -> Result<(), ScrapeError> {
    // MySQL/Percona call the fields Master_*, recent MySQL Source_*.
    let mut master_uuid = row.get("Master_UUID");
    if master_uuid.is_empty() {
        master_uuid = row.get("Source_UUID");
    }
    let mut master_host = row.get("Master_Host");
    if master_host.is_empty() {
        master_host = row.get("Source_Host");
    }
    let channel_name = row.get("Channel_Name"); // MySQL & Percona
    let connection_name = row.get("Connection_name"); // MariaDB

    let label_values = [master_host, master_uuid, channel_name, connection_name];

    for column in row.columns() {
        if let Some(value) = row.number(column) {
            sink.untyped(
                &format!("{NAMESPACE}_{SUBSYSTEM}_{}", column.to_ascii_lowercase()),
                "Generic metric from SHOW SLAVE STATUS.",
                &LABELS,
                &label_values,
                value,
            )?;
        }
    }

    for column in GTID_COLUMNS {
        emit_gtid_positions(sink, column, row.get(column), &label_values)?;
    }

    Ok(())
}

/// Emit one gauge per well-formed `<domain>-<server>-<sequence>` entry;
/// malformed entries are skipped without aborting the rest.
#[allow(clippy::cast_precision_loss)]
fn emit_gtid_positions(
    sink: &MetricSink,
    column: &str,
    value: &str,
    base: &[&str; 4],
) -> Result<(), ScrapeError> {
    if value.is_empty() {
        return Ok(());
    }

    let [master_host, master_uuid, channel_name, connection_name] = *base;

    for gtid in value.split(',') {
        let mut parts = gtid.split('-');
        let (Some(domain), Some(server), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(sequence) = sequence.parse::<u64>() else {
            continue;
        };

        sink.gauge(
            &format!("{NAMESPACE}_{SUBSYSTEM}_{}", column.to_ascii_lowercase()),
            &format!("{column} metric from SHOW SLAVE STATUS."),
            &[
                "master_host",
                "master_uuid",
                "channel_name",
                "connection_name",
                "domain_id",
                "server_id",
            ],
            &[
                master_host,
                master_uuid,
                channel_name,
                connection_name,
                domain,
                server,
            ],
            sequence as f64,
        )?;
    }

    Ok(())
}
