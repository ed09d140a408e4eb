pub mod run;

use std::path::PathBuf;

/// What the process was asked to do.
#[derive(Debug)]
pub enum Action {
    Run {
        port: u16,
        listen: Option<String>,
        config: PathBuf,
        address: String,
        user: Option<String>,
        timeout_offset: f64,
        metrics_path: String,
        scrapers: Vec<String>,
    },
}
