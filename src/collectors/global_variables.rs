//! `SHOW GLOBAL VARIABLES` scraper.

use crate::collectors::{Instance, MetricSink, NAMESPACE, ScrapeError, Scraper, util};
use futures::future::BoxFuture;
use tracing::info_span;
use tracing_futures::Instrument as _;

const SUBSYSTEM: &str = "global_variables";

/// Collects from `SHOW GLOBAL VARIABLES`.
#[derive(Clone, Copy, Default)]
pub struct GlobalVariables;

impl GlobalVariables {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scraper for GlobalVariables {
    fn name(&self) -> &'static str {
        "global_variables"
    }

    fn help(&self) -> &'static str {
        "Collect from SHOW GLOBAL VARIABLES"
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
                db.statement = "SHOW GLOBAL VARIABLES",
                otel.kind = "client"
            );

            let rows: Vec<(String, String)> = sqlx::query_as("SHOW GLOBAL VARIABLES")
                .fetch_all(instance.pool())
                .instrument(span)
                .await?;

            emit_variables(sink, &rows)
        })
    }
}

/// One gauge per numeric server variable; text-valued variables are skipped.
pub(crate) fn emit_variables(
    sink: &MetricSink,
    rows: &[(String, String)],
) -> Result<(), ScrapeError> {
    for (variable, value) in rows {
        let Some(value) = util::parse_number(value) else {
            continue;
        };

        sink.gauge(
            &format!("{NAMESPACE}_{SUBSYSTEM}_{}", variable.to_ascii_lowercase()),
            "Generic gauge metric from SHOW GLOBAL VARIABLES.",
            &[],
            &[],
            value,
        )?;
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

    #[test]
    fn test_numeric_and_flag_variables() {
        let sink = MetricSink::new();
        let rows = vec![
            ("max_connections".to_string(), "151".to_string()),
            ("read_only".to_string(), "OFF".to_string()),
            ("version_comment".to_string(), "MariaDB Server".to_string()),
        ];

        emit_variables(&sink, &rows).expect("emit");

        let families = sink.gather();

        let max = family(&families, "mysql_global_variables_max_connections").expect("family");
        let value = max
            .get_metric()
            .first()
            .expect("sample")
            .get_gauge()
            .value
            .unwrap_or(0.0);
        assert!((value - 151.0).abs() < f64::EPSILON);

        let read_only = family(&families, "mysql_global_variables_read_only").expect("family");
        let value = read_only
            .get_metric()
            .first()
            .expect("sample")
            .get_gauge()
            .value
            .unwrap_or(1.0);
        assert!(value.abs() < f64::EPSILON);

        assert!(family(&families, "mysql_global_variables_version_comment").is_none());
    }
}
