pub mod scrapers;

use clap::{Arg, Command, value_parser};

/// Build the command line interface.
#[must_use]
pub fn new() -> Command {
    let command = Command::new("mysqld_exporter")
        .about("MySQL/MariaDB metric exporter for Prometheus")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Port to listen on")
                .default_value("9104")
                .value_parser(value_parser!(u16))
                .env("MYSQLD_EXPORTER_PORT"),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .help("Address to listen on (default: auto-detect IPv6, fallback IPv4)")
                .env("MYSQLD_EXPORTER_LISTEN"),
        )
        .arg(
            Arg::new("web.telemetry-path")
                .long("web.telemetry-path")
                .help("Path under which to expose metrics")
                .default_value("/metrics"),
        )
        .arg(
            Arg::new("timeout-offset")
                .long("timeout-offset")
                .help("Offset to subtract from timeout in seconds")
                .default_value("0.25")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("config.my-cnf")
                .long("config.my-cnf")
                .help("Path to .my.cnf file to read MySQL credentials from")
                .default_value(".my.cnf")
                .env("MYSQLD_EXPORTER_CONFIG_MY_CNF"),
        )
        .arg(
            Arg::new("mysqld.address")
                .long("mysqld.address")
                .help("Address to use for connecting to MySQL")
                .default_value("localhost:3306")
                .env("MYSQLD_EXPORTER_ADDRESS"),
        )
        .arg(
            Arg::new("mysqld.username")
                .long("mysqld.username")
                .help("Username to use for connecting to MySQL")
                .env("MYSQLD_EXPORTER_USERNAME"),
        );

    scrapers::add_scraper_args(command)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_defaults() {
        let matches = new().get_matches_from(vec!["mysqld_exporter"]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9104));
        assert_eq!(
            matches.get_one::<String>("web.telemetry-path").unwrap(),
            "/metrics"
        );
        assert_eq!(
            matches.get_one::<f64>("timeout-offset").copied(),
            Some(0.25)
        );
        assert_eq!(
            matches.get_one::<String>("config.my-cnf").unwrap(),
            ".my.cnf"
        );
        assert_eq!(
            matches.get_one::<String>("mysqld.address").unwrap(),
            "localhost:3306"
        );
        assert!(matches.get_one::<String>("mysqld.username").is_none());
    }

    #[test]
    fn test_explicit_values() {
        let matches = new().get_matches_from(vec![
            "mysqld_exporter",
            "--port",
            "9999",
            "--timeout-offset",
            "0.5",
            "--mysqld.address",
            "db1:3307",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9999));
        assert_eq!(matches.get_one::<f64>("timeout-offset").copied(), Some(0.5));
        assert_eq!(
            matches.get_one::<String>("mysqld.address").unwrap(),
            "db1:3307"
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = new().try_get_matches_from(vec!["mysqld_exporter", "--port", "70000"]);

        assert!(result.is_err());
    }
}
