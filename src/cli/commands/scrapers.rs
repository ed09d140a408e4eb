use crate::collectors::{Scraper, all_scrapers};
use clap::{Arg, Command};

/// Add one `--collect.<name>` / `--no-collect.<name>` flag pair per scraper
/// in the registry.
#[must_use]
pub fn add_scraper_args(mut cmd: Command) -> Command {
    for scraper in all_scrapers() {
        let name = scraper.name();
        let default_enabled = scraper.enabled_by_default();

        let enable_flag: &'static str = Box::leak(format!("collect.{name}").into_boxed_str());
        let disable_flag: &'static str = Box::leak(format!("no-collect.{name}").into_boxed_str());

        let default_indicator = if default_enabled {
            " [default: enabled]"
        } else {
            " [default: disabled]"
        };
        let enable_help: &'static str =
            Box::leak(format!("{}{default_indicator}", scraper.help()).into_boxed_str());
        let disable_help: &'static str =
            Box::leak(format!("Disable the {name} scraper").into_boxed_str());

        cmd = cmd
            .arg(
                Arg::new(enable_flag)
                    .long(enable_flag)
                    .help(enable_help)
                    .action(clap::ArgAction::SetTrue)
                    .default_value(if default_enabled { "true" } else { "false" }),
            )
            .arg(
                Arg::new(disable_flag)
                    .long(disable_flag)
                    .help(disable_help)
                    .action(clap::ArgAction::SetTrue)
                    .overrides_with(enable_flag),
            );
    }

    cmd
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::cli::commands;
    use crate::cli::dispatch::get_enabled_scrapers;

    #[test]
    fn test_all_scraper_flags_are_added() {
        let cmd = commands::new();
        let matches = cmd
            .try_get_matches_from(vec!["mysqld_exporter"])
            .unwrap();

        for scraper in all_scrapers() {
            let name = scraper.name();
            assert!(
                matches.contains_id(&format!("collect.{name}")),
                "Missing enable flag for {name}"
            );
            assert!(
                matches.contains_id(&format!("no-collect.{name}")),
                "Missing disable flag for {name}"
            );
        }
    }

    #[test]
    fn test_scraper_flag_defaults_match_registry() {
        let matches = commands::new().get_matches_from(vec!["mysqld_exporter"]);

        for scraper in all_scrapers() {
            let name = scraper.name();
            assert_eq!(
                matches.get_flag(&format!("collect.{name}")),
                scraper.enabled_by_default(),
                "Scraper '{name}' default mismatch"
            );
        }
    }

    #[test]
    fn test_disable_flag_wins_when_last() {
        let matches = commands::new().get_matches_from(vec![
            "mysqld_exporter",
            "--collect.global_status",
            "--no-collect.global_status",
        ]);
        let enabled = get_enabled_scrapers(&matches);

        assert!(!enabled.contains(&"global_status".to_string()));
    }

    #[test]
    fn test_enable_flag_wins_when_last() {
        let matches = commands::new().get_matches_from(vec![
            "mysqld_exporter",
            "--no-collect.global_status",
            "--collect.global_status",
        ]);
        let enabled = get_enabled_scrapers(&matches);

        assert!(enabled.contains(&"global_status".to_string()));
    }

    #[test]
    fn test_disabled_by_default_scraper_can_be_enabled() {
        let matches = commands::new().get_matches_from(vec![
            "mysqld_exporter",
            "--collect.info_schema.tables",
        ]);
        let enabled = get_enabled_scrapers(&matches);

        assert!(enabled.contains(&"info_schema.tables".to_string()));
    }
}
