use futures::future::BoxFuture;
use std::collections::HashSet;

#[macro_use]
mod register_macro;

pub mod exporter;
pub mod instance;
pub mod row;
pub mod sink;
pub mod util;

pub use exporter::Exporter;
pub use instance::{Instance, ServerVariant};
pub use row::NamedRow;
pub use sink::{MetricSink, ValueKind};

/// Metric name prefix shared by every scraper.
pub const NAMESPACE: &str = "mysql";

/// Error raised by a scraper. Handled by the `Exporter`, never surfaced to
/// the HTTP caller: a failed scraper turns into a success gauge of 0 and a
/// warning log line.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Query(#[from] sqlx::Error),

    #[error(transparent)]
    Metric(#[from] prometheus::Error),

    /// Every replication status query dialect failed; carries the last error.
    #[error("all replication status query dialects failed: {0}")]
    DialectExhausted(Box<ScrapeError>),

    #[error("scrape deadline exceeded")]
    DeadlineExceeded,
}

impl ScrapeError {
    /// Whether the error was caused by the scrape deadline expiring.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// A scraper queries one administrative/status surface of the server and
/// writes metrics into the request's sink.
///
/// Scrapers are stateless and constructed once at startup; the same value is
/// reused across concurrent requests.
pub trait Scraper: Send + Sync {
    /// Unique identity, used for the `collect[]` parameter, CLI flags and
    /// the per-scraper success gauge.
    fn name(&self) -> &'static str;

    /// Human readable description of the scraper.
    fn help(&self) -> &'static str;

    /// Minimum server version (major.minor) the scraper supports.
    fn version(&self) -> f64;

    fn enabled_by_default(&self) -> bool {
        false
    }

    /// Run the scraper against the shared connection handle, emitting
    /// metrics into `sink`.
    fn scrape<'a>(
        &'a self,
        instance: &'a Instance,
        sink: &'a MetricSink,
    ) -> BoxFuture<'a, Result<(), ScrapeError>>;
}

register_scrapers! {
    global_status => GlobalStatus,
    global_variables => GlobalVariables,
    slave_status => SlaveStatus,
    info_schema => TableSchema,
}

/// Narrow `scrapers` to the identities listed in `collect`, preserving the
/// registry's iteration order.
///
/// An empty `collect` list, or one naming only unknown identities, yields
/// the full input set: a scrape request never silently selects nothing.
#[must_use]
pub fn filter_scrapers(scrapers: &[ScraperType], collect: &[String]) -> Vec<ScraperType> {
    if !collect.is_empty() {
        let wanted: HashSet<&str> = collect.iter().map(String::as_str).collect();

        let filtered: Vec<ScraperType> = scrapers
            .iter()
            .filter(|scraper| wanted.contains(scraper.name()))
            .cloned()
            .collect();

        if !filtered.is_empty() {
            return filtered;
        }
    }

    scrapers.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scrapers: &[ScraperType]) -> Vec<&'static str> {
        scrapers.iter().map(Scraper::name).collect()
    }

    #[test]
    fn test_registry_is_ordered_and_unique() {
        let all = all_scrapers();
        let got = names(&all);

        assert_eq!(
            got,
            vec![
                "global_status",
                "global_variables",
                "slave_status",
                "info_schema.tables"
            ]
        );
    }

    #[test]
    fn test_default_enabled_set() {
        let enabled: Vec<&str> = all_scrapers()
            .iter()
            .filter(|s| s.enabled_by_default())
            .map(Scraper::name)
            .collect();

        assert_eq!(
            enabled,
            vec!["global_status", "global_variables", "slave_status"]
        );
    }

    #[test]
    fn test_filter_empty_list_returns_everything() {
        let all = all_scrapers();
        let filtered = filter_scrapers(&all, &[]);

        assert_eq!(names(&all), names(&filtered));
    }

    #[test]
    fn test_filter_is_idempotent_for_full_set() {
        let all = all_scrapers();
        let full_list: Vec<String> = all.iter().map(|s| s.name().to_string()).collect();

        let filtered = filter_scrapers(&all, &full_list);

        assert_eq!(names(&all), names(&filtered));
    }

    #[test]
    fn test_filter_unknown_only_falls_back_to_default_set() {
        let all = all_scrapers();
        let filtered = filter_scrapers(&all, &["nope".to_string(), "also_nope".to_string()]);

        assert_eq!(names(&all), names(&filtered));
    }

    #[test]
    fn test_filter_subset_preserves_registry_order() {
        let all = all_scrapers();
        // Request in reverse order; result must follow registry order.
        let filtered = filter_scrapers(
            &all,
            &["slave_status".to_string(), "global_status".to_string()],
        );

        assert_eq!(names(&filtered), vec!["global_status", "slave_status"]);
    }

    #[test]
    fn test_filter_mixes_known_and_unknown() {
        let all = all_scrapers();
        let filtered = filter_scrapers(
            &all,
            &["unknown".to_string(), "global_variables".to_string()],
        );

        assert_eq!(names(&filtered), vec!["global_variables"]);
    }
}
