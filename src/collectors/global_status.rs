//! `SHOW GLOBAL STATUS` scraper.

use crate::collectors::{Instance, MetricSink, NAMESPACE, ScrapeError, Scraper, util};
use futures::future::BoxFuture;
use tracing::info_span;
use tracing_futures::Instrument as _;

const SUBSYSTEM: &str = "global_status";

/// Collects from `SHOW GLOBAL STATUS`.
#[derive(Clone, Copy, Default)]
pub struct GlobalStatus;

impl GlobalStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scraper for GlobalStatus {
    fn name(&self) -> &'static str {
        "global_status"
    }

    fn help(&self) -> &'static str {
        "Collect from SHOW GLOBAL STATUS"
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
            let span = info_span!(
                "db.query",
                db.system = "mysql",
                db.operation = "SHOW",
                db.statement = "SHOW GLOBAL STATUS",
                otel.kind = "client"
            );

            let rows: Vec<(String, String)> = sqlx::query_as("SHOW GLOBAL STATUS")
                .fetch_all(instance.pool())
                .instrument(span)
                .await?;

            emit_status_variables(sink, &rows)
        })
    }
}

/// Map status variables onto metrics: `Com_*` counters are folded into one
/// labeled family, everything else numeric becomes a generic untyped metric,
/// and text values are skipped.
pub(crate) fn emit_status_variables(
    sink: &MetricSink,
    rows: &[(String, String)],
) -> Result<(), ScrapeError> {
    for (variable, value) in rows {
        let Some(value) = util::parse_number(value) else {
            continue;
        };

        if let Some(command) = variable.strip_prefix("Com_") {
            sink.counter(
                &format!("{NAMESPACE}_{SUBSYSTEM}_commands_total"),
                "Total number of executed MySQL commands.",
                &["command"],
                &[&command.to_ascii_lowercase()],
                value,
            )?;
        } else {
            sink.untyped(
                &format!("{NAMESPACE}_{SUBSYSTEM}_{}", variable.to_ascii_lowercase()),
                "Generic metric from SHOW GLOBAL STATUS.",
                &[],
                &[],
                value,
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::unwrap_used)]

    use super::*;
    use prometheus::proto;

    fn family<'a>(
        families: &'a [proto::MetricFamily],
        name: &str,
    ) -> Option<&'a proto::MetricFamily> {
        families.iter().find(|f| f.name() == name)
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_numeric_variables_become_untyped_metrics() {
        let sink = MetricSink::new();
        emit_status_variables(&sink, &rows(&[("Threads_connected", "12")])).expect("emit");

        let families = sink.gather();
        let fam = family(&families, "mysql_global_status_threads_connected").expect("family");
        let value = fam
            .get_metric()
            .first()
            .expect("sample")
            .get_gauge()
            .value
            .unwrap_or(0.0);

        assert!((value - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_command_counters_share_one_family() {
        let sink = MetricSink::new();
        emit_status_variables(
            &sink,
            &rows(&[("Com_select", "100"), ("Com_insert", "25")]),
        )
        .expect("emit");

        let families = sink.gather();
        let fam = family(&families, "mysql_global_status_commands_total").expect("family");

        assert_eq!(fam.get_metric().len(), 2);
        assert!(family(&families, "mysql_global_status_com_select").is_none());
    }

    #[test]
    fn test_text_variables_are_skipped() {
        let sink = MetricSink::new();
        emit_status_variables(
            &sink,
            &rows(&[
                ("Rsa_public_key", "-----BEGIN PUBLIC KEY-----"),
                ("Compression", "OFF"),
            ]),
        )
        .expect("emit");

        let families = sink.gather();

        assert!(family(&families, "mysql_global_status_rsa_public_key").is_none());
        // Flags still parse.
        assert!(family(&families, "mysql_global_status_compression").is_some());
    }
}
