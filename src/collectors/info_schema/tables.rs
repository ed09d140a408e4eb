//! `information_schema.tables` scraper.

use crate::collectors::{Instance, MetricSink, NAMESPACE, NamedRow, ScrapeError, Scraper};
use futures::future::BoxFuture;
use tracing::info_span;
use tracing_futures::Instrument as _;

const SUBSYSTEM: &str = "info_schema";

const TABLES_QUERY: &str = "
    SELECT
        TABLE_SCHEMA,
        TABLE_NAME,
        TABLE_TYPE,
        ifnull(ENGINE, 'NONE') as ENGINE,
        ifnull(VERSION, '0') as VERSION,
        ifnull(ROW_FORMAT, 'NONE') as ROW_FORMAT,
        ifnull(TABLE_ROWS, '0') as TABLE_ROWS,
        ifnull(DATA_LENGTH, '0') as DATA_LENGTH,
        ifnull(INDEX_LENGTH, '0') as INDEX_LENGTH,
        ifnull(DATA_FREE, '0') as DATA_FREE,
        ifnull(CREATE_OPTIONS, 'NONE') as CREATE_OPTIONS
      FROM information_schema.tables
      WHERE TABLE_SCHEMA = ?
    ";

const DB_LIST_QUERY: &str = "
    SELECT
        SCHEMA_NAME
      FROM information_schema.schemata
      WHERE SCHEMA_NAME NOT IN ('mysql', 'performance_schema', 'information_schema', 'sys')
    ";

/// Collects table stats from `information_schema.tables`.
///
/// Disabled by default: the per-table cardinality is unbounded on busy
/// servers.
#[derive(Clone, Copy, Default)]
pub struct TableSchema;

impl TableSchema {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scraper for TableSchema {
    fn name(&self) -> &'static str {
        "info_schema.tables"
    }

    fn help(&self) -> &'static str {
        "Collect metrics from information_schema.tables"
    }

    fn version(&self) -> f64 {
        5.1
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
                db.operation = "SELECT",
                db.statement = "information_schema.schemata",
                otel.kind = "client"
            );

            let databases: Vec<(String,)> = sqlx::query_as(DB_LIST_QUERY)
                .fetch_all(instance.pool())
                .instrument(span)
                .await?;

            for (database,) in &databases {
                let span = info_span!(
                    "db.query",
                    db.system = "mysql",
                    db.operation = "SELECT",
                    db.statement = "information_schema.tables",
                    db.name = %database,
                    otel.kind = "client"
                );

                let rows = sqlx::query(TABLES_QUERY)
                    .bind(database)
                    .fetch_all(instance.pool())
                    .instrument(span)
                    .await?;

                for row in &rows {
                    emit_table_row(sink, &NamedRow::from_mysql(row))?;
                }
            }

            Ok(())
        })
    }
}

/// Emit the version, row-count, and size gauges for one table row.
pub(crate) fn emit_table_row(sink: &MetricSink, row: &NamedRow) -> Result<(), ScrapeError> {
    let schema = row.get("TABLE_SCHEMA");
    let table = row.get("TABLE_NAME");

    if let Some(version) = row.number("VERSION") {
        sink.gauge(
            &format!("{NAMESPACE}_{SUBSYSTEM}_table_version"),
            "The version number of the table's .frm file",
            &["schema", "table", "type", "engine", "row_format", "create_options"],
            &[
                schema,
                table,
                row.get("TABLE_TYPE"),
                row.get("ENGINE"),
                row.get("ROW_FORMAT"),
                row.get("CREATE_OPTIONS"),
            ],
            version,
        )?;
    }

    if let Some(rows) = row.number("TABLE_ROWS") {
        sink.gauge(
            &format!("{NAMESPACE}_{SUBSYSTEM}_table_rows"),
            "The estimated number of rows in the table from information_schema.tables",
            &["schema", "table"],
            &[schema, table],
            rows,
        )?;
    }

    for (column, component) in [
        ("DATA_LENGTH", "data_length"),
        ("INDEX_LENGTH", "index_length"),
        ("DATA_FREE", "data_free"),
    ] {
        if let Some(size) = row.number(column) {
            sink.gauge(
                &format!("{NAMESPACE}_{SUBSYSTEM}_table_size"),
                "The size of the table components from information_schema.tables",
                &["schema", "table", "component"],
                &[schema, table, component],
                size,
            )?;
        }
    }

    Ok(())
}
