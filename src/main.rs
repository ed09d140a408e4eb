use anyhow::Result;
use mysqld_exporter::cli::{self, actions};

#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;
    actions::run::handle(action).await
}
