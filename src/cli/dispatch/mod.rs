use crate::cli::actions::Action;
use crate::collectors::{Scraper, all_scrapers};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use std::path::PathBuf;

/// Turn parsed matches into the action to run.
///
/// # Errors
///
/// Returns an error if required arguments are missing
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    let listen = matches
        .get_one::<String>("listen")
        .map(std::string::ToString::to_string);

    let config = matches
        .get_one::<String>("config.my-cnf")
        .cloned()
        .ok_or_else(|| anyhow!("Config file path is required (--config.my-cnf)."))?;

    let address = matches
        .get_one::<String>("mysqld.address")
        .cloned()
        .ok_or_else(|| anyhow!("MySQL address is required (--mysqld.address)."))?;

    let user = matches.get_one::<String>("mysqld.username").cloned();

    let timeout_offset = matches
        .get_one::<f64>("timeout-offset")
        .copied()
        .unwrap_or(0.25);

    let metrics_path = matches
        .get_one::<String>("web.telemetry-path")
        .cloned()
        .unwrap_or_else(|| "/metrics".to_string());

    Ok(Action::Run {
        port,
        listen,
        config: PathBuf::from(config),
        address,
        user,
        timeout_offset,
        metrics_path,
        scrapers: get_enabled_scrapers(matches),
    })
}

/// Resolve the enabled scraper set from the per-scraper flag pairs, falling
/// back to each scraper's default.
#[must_use]
pub fn get_enabled_scrapers(matches: &ArgMatches) -> Vec<String> {
    all_scrapers()
        .iter()
        .filter(|scraper| {
            let name = scraper.name();
            let enable_flag = format!("collect.{name}");
            let disable_flag = format!("no-collect.{name}");

            // If explicitly disabled, skip it
            if matches.get_flag(&disable_flag) {
                return false;
            }

            // If explicitly enabled, include it
            if matches.get_flag(&enable_flag) {
                return true;
            }

            scraper.enabled_by_default()
        })
        .map(|scraper| scraper.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_builds_run_action() {
        let matches = commands::new().get_matches_from(vec![
            "mysqld_exporter",
            "--port",
            "9105",
            "--config.my-cnf",
            "/etc/my.cnf",
        ]);

        let action = handler(&matches).unwrap();

        match action {
            Action::Run {
                port,
                config,
                address,
                metrics_path,
                scrapers,
                ..
            } => {
                assert_eq!(port, 9105);
                assert_eq!(config, PathBuf::from("/etc/my.cnf"));
                assert_eq!(address, "localhost:3306");
                assert_eq!(metrics_path, "/metrics");
                assert!(scrapers.contains(&"global_status".to_string()));
            }
        }
    }

    #[test]
    fn test_enabled_scrapers_defaults() {
        let matches = commands::new().get_matches_from(vec!["mysqld_exporter"]);
        let enabled = get_enabled_scrapers(&matches);

        assert_eq!(
            enabled,
            vec!["global_status", "global_variables", "slave_status"]
        );
    }

    #[test]
    fn test_enabled_scrapers_explicit_enable() {
        let matches = commands::new().get_matches_from(vec![
            "mysqld_exporter",
            "--collect.info_schema.tables",
        ]);
        let enabled = get_enabled_scrapers(&matches);

        assert!(enabled.contains(&"global_status".to_string()));
        assert!(enabled.contains(&"info_schema.tables".to_string()));
    }

    #[test]
    fn test_enabled_scrapers_explicit_disable() {
        let matches = commands::new()
            .get_matches_from(vec!["mysqld_exporter", "--no-collect.slave_status"]);
        let enabled = get_enabled_scrapers(&matches);

        assert!(!enabled.contains(&"slave_status".to_string()));
        assert!(enabled.contains(&"global_status".to_string()));
    }
}
