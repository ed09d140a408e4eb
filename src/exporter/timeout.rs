//! Scrape deadline derivation.
//!
//! Prometheus announces its own scrape timeout in the
//! `X-Prometheus-Scrape-Timeout-Seconds` request header. The effective
//! deadline is that value minus a configured safety offset, so the exporter
//! answers with partial results before the scraper gives up on it. Failures
//! here fail open: the request proceeds without a derived deadline and only
//! inherits the client's disconnect.

use std::time::Duration;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TimeoutError {
    #[error("timeout value from Prometheus header is invalid: {0:?}")]
    InvalidTimeout(String),

    #[error("timeout offset ({offset}) should be lower than prometheus scrape timeout ({timeout})")]
    TimeoutTooTight { offset: f64, timeout: f64 },
}

/// Derive the effective scrape timeout from the header value and the
/// configured offset.
///
/// An absent or zero header means no deadline.
///
/// # Errors
///
/// `InvalidTimeout` for an unparsable or negative value, `TimeoutTooTight`
/// when the offset leaves no time to scrape.
#[allow(clippy::float_cmp)]
pub fn scrape_timeout(
    header: Option<&str>,
    offset: f64,
) -> Result<Option<Duration>, TimeoutError> {
    let Some(raw) = header else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let timeout: f64 = raw
        .parse()
        .map_err(|_| TimeoutError::InvalidTimeout(raw.to_string()))?;

    if !timeout.is_finite() || timeout < 0.0 {
        return Err(TimeoutError::InvalidTimeout(raw.to_string()));
    }
    if timeout == 0.0 {
        return Ok(None);
    }
    if offset >= timeout {
        return Err(TimeoutError::TimeoutTooTight { offset, timeout });
    }

    Ok(Some(Duration::from_secs_f64(timeout - offset)))
}
