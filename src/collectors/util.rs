//! Shared helpers for scrapers:
//! - Interpreting status values of unknown type as numbers.
//! - Extracting the server version/variant from `SELECT VERSION()`.

use crate::collectors::ServerVariant;
use once_cell::sync::OnceCell;
use regex::Regex;

/// Interpret a raw status value as a number.
///
/// Status tables mix numeric columns with flags (`Yes`/`No`, `ON`/`OFF`) and
/// free text; flags map onto 0/1, free text yields `None` and the caller
/// skips the column.
#[must_use]
pub fn parse_number(value: &str) -> Option<f64> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "on" => Some(1.0),
        "no" | "off" | "connecting" => Some(0.0),
        other => other.parse::<f64>().ok(),
    }
}

/// Parse the output of `SELECT VERSION()` into a major.minor number and the
/// server variant, e.g. `"10.5.8-MariaDB-log"` -> `(10.5, MariaDb)`,
/// `"8.0.36"` -> `(8.0, MySql)`.
///
/// An unrecognizable version string yields `(0.0, MySql)`; scrapers gated on
/// a minimum version are then skipped rather than run blind.
///
/// # Panics
///
/// Panics if the version regex cannot be compiled (should never happen).
#[must_use]
pub fn server_version(version_string: &str) -> (f64, ServerVariant) {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^(\d+)\.(\d+)").expect("Invalid regex")
    });

    let variant = if version_string.to_ascii_lowercase().contains("mariadb") {
        ServerVariant::MariaDb
    } else {
        ServerVariant::MySql
    };

    let version = re
        .captures(version_string)
        .and_then(|caps| {
            let major = caps.get(1)?.as_str();
            let minor = caps.get(2)?.as_str();
            format!("{major}.{minor}").parse::<f64>().ok()
        })
        .unwrap_or(0.0);

    (version, variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_flags() {
        assert_eq!(parse_number("Yes"), Some(1.0));
        assert_eq!(parse_number("ON"), Some(1.0));
        assert_eq!(parse_number("No"), Some(0.0));
        assert_eq!(parse_number("off"), Some(0.0));
        assert_eq!(parse_number("Connecting"), Some(0.0));
    }

    #[test]
    fn test_parse_number_numerics() {
        assert_eq!(parse_number("0"), Some(0.0));
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("3.14"), Some(3.14));
        assert_eq!(parse_number("-1"), Some(-1.0));
        assert_eq!(parse_number(" 17 "), Some(17.0));
    }

    #[test]
    fn test_parse_number_text_is_skipped() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("mysql-bin.000123:text"), None);
        assert_eq!(parse_number("Waiting for master to send event"), None);
    }

    #[test]
    fn test_server_version_mariadb() {
        let (version, variant) = server_version("10.5.8-MariaDB-log");
        assert!((version - 10.5).abs() < f64::EPSILON);
        assert_eq!(variant, ServerVariant::MariaDb);
    }

    #[test]
    fn test_server_version_mysql() {
        let (version, variant) = server_version("8.0.36");
        assert!((version - 8.0).abs() < f64::EPSILON);
        assert_eq!(variant, ServerVariant::MySql);
    }

    #[test]
    fn test_server_version_unparsable() {
        let (version, variant) = server_version("garbage");
        assert!(version.abs() < f64::EPSILON);
        assert_eq!(variant, ServerVariant::MySql);
    }
}
