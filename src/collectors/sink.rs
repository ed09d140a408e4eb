//! Request-scoped metric sink.
//!
//! Every scrape request gets a fresh registry so descriptors from a previous
//! target can never leak into the current exposition. Scrapers write
//! `(name, labels, value, kind)` tuples; the sink materializes one metric
//! family per name on first use and feeds values into it.

use prometheus::{CounterVec, GaugeVec, Opts, Registry, proto};
use std::collections::HashMap;
use std::sync::Mutex;

/// The exposition kind of an emitted value.
///
/// The Rust `prometheus` crate has no untyped metric, so `Untyped` is
/// rendered as a gauge; the sample value is unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Counter,
    Gauge,
    Untyped,
}

enum Family {
    Gauges(GaugeVec),
    Counters(CounterVec),
}

/// Collects metrics emitted by the scrapers of a single request.
///
/// Shared by reference across concurrently running scrapers; the family map
/// is the only guarded state and is never held across an await point.
pub struct MetricSink {
    registry: Registry,
    families: Mutex<HashMap<String, Family>>,
}

impl Default for MetricSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: Mutex::new(HashMap::new()),
        }
    }

    /// Emit one value.
    ///
    /// `labels` are the family's label names and `values` the label values
    /// for this sample; both must keep the same arity for a given `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` was already emitted with a different kind
    /// or label set, or if a counter value is negative.
    pub fn write(
        &self,
        kind: ValueKind,
        name: &str,
        help: &str,
        labels: &[&str],
        values: &[&str],
        value: f64,
    ) -> Result<(), prometheus::Error> {
        let mut families = match self.families.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("metric sink lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        if !families.contains_key(name) {
            let opts = Opts::new(name, help);
            let family = match kind {
                ValueKind::Gauge | ValueKind::Untyped => {
                    let vec = GaugeVec::new(opts, labels)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Gauges(vec)
                }
                ValueKind::Counter => {
                    let vec = CounterVec::new(opts, labels)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Counters(vec)
                }
            };
            families.insert(name.to_string(), family);
        }

        match families.get(name) {
            Some(Family::Gauges(vec)) => {
                if kind == ValueKind::Counter {
                    return Err(prometheus::Error::Msg(format!(
                        "metric {name} already emitted as a gauge"
                    )));
                }
                vec.get_metric_with_label_values(values)?.set(value);
            }
            Some(Family::Counters(vec)) => {
                if kind != ValueKind::Counter {
                    return Err(prometheus::Error::Msg(format!(
                        "metric {name} already emitted as a counter"
                    )));
                }
                if value < 0.0 {
                    return Err(prometheus::Error::Msg(format!(
                        "negative counter value for metric {name}"
                    )));
                }
                vec.get_metric_with_label_values(values)?.inc_by(value);
            }
            None => {}
        }

        Ok(())
    }

    /// Emit a gauge sample.
    ///
    /// # Errors
    ///
    /// See [`MetricSink::write`].
    pub fn gauge(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        values: &[&str],
        value: f64,
    ) -> Result<(), prometheus::Error> {
        self.write(ValueKind::Gauge, name, help, labels, values, value)
    }

    /// Emit a counter sample (absolute value; the registry is per-request).
    ///
    /// # Errors
    ///
    /// See [`MetricSink::write`].
    pub fn counter(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        values: &[&str],
        value: f64,
    ) -> Result<(), prometheus::Error> {
        self.write(ValueKind::Counter, name, help, labels, values, value)
    }

    /// Emit an untyped sample.
    ///
    /// # Errors
    ///
    /// See [`MetricSink::write`].
    pub fn untyped(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        values: &[&str],
        value: f64,
    ) -> Result<(), prometheus::Error> {
        self.write(ValueKind::Untyped, name, help, labels, values, value)
    }

    /// Gather everything emitted so far, ready for text encoding.
    #[must_use]
    pub fn gather(&self) -> Vec<proto::MetricFamily> {
        self.registry.gather()
    }
}
