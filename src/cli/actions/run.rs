use crate::cli::actions::Action;
use crate::collectors::{Scraper, ScraperType, all_scrapers};
use crate::config::ConfigHandler;
use crate::exporter;
use anyhow::Result;
use tracing::info;

/// Handle the run action
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the exporter
/// fails to start
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run {
            port,
            listen,
            config,
            address,
            user,
            timeout_offset,
            metrics_path,
            scrapers,
        } => {
            let config = ConfigHandler::load(config, address, user)?;

            let enabled: Vec<ScraperType> = all_scrapers()
                .into_iter()
                .filter(|scraper| scrapers.iter().any(|name| name == scraper.name()))
                .collect();

            for scraper in &enabled {
                info!(scraper = scraper.name(), "scraper enabled");
            }

            exporter::new(port, listen, config, enabled, timeout_offset, metrics_path).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_handle_fails_without_config_file() {
        let action = Action::Run {
            port: 9104,
            listen: None,
            config: PathBuf::from("/nonexistent/my.cnf"),
            address: "localhost:3306".to_string(),
            user: None,
            timeout_offset: 0.25,
            metrics_path: "/metrics".to_string(),
            scrapers: vec!["global_status".to_string()],
        };

        let result = handle(action).await;

        assert!(result.is_err(), "Should fail without a config file");
    }

    #[test]
    fn test_action_creation() {
        let action = Action::Run {
            port: 9104,
            listen: Some("127.0.0.1".to_string()),
            config: PathBuf::from(".my.cnf"),
            address: "localhost:3306".to_string(),
            user: Some("exporter".to_string()),
            timeout_offset: 0.25,
            metrics_path: "/metrics".to_string(),
            scrapers: vec!["global_status".to_string(), "slave_status".to_string()],
        };

        match action {
            Action::Run {
                port,
                listen,
                scrapers,
                ..
            } => {
                assert_eq!(port, 9104);
                assert_eq!(listen, Some("127.0.0.1".to_string()));
                assert_eq!(scrapers.len(), 2);
            }
        }
    }
}
