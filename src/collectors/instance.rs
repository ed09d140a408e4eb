//! The connection handle shared by every scraper of a request.

use crate::collectors::{ScrapeError, util};
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::time::Duration;
use tracing::debug;

/// Server implementation family, detected from `SELECT VERSION()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerVariant {
    MariaDb,
    MySql,
}

impl ServerVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MariaDb => "mariadb",
            Self::MySql => "mysql",
        }
    }
}

/// Owns the single database connection of a scrape plus the server metadata
/// detected on connect.
///
/// Scrapers never open their own connections; they run their statements
/// through this handle's pool, which holds at most one physical connection,
/// so concurrent scrapers queue on acquire instead of interleaving
/// statements on one wire.
pub struct Instance {
    pool: MySqlPool,
    version: f64,
    variant: ServerVariant,
    version_string: String,
}

impl Instance {
    /// Establish the connection and detect server version and variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, authentication fails,
    /// or the version query fails.
    pub async fn connect(opts: MySqlConnectOptions) -> Result<Self, ScrapeError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(opts)
            .await?;

        let (version_string,): (String,) =
            sqlx::query_as("SELECT VERSION()").fetch_one(&pool).await?;

        let (version, variant) = util::server_version(&version_string);
        debug!(
            version = %version_string,
            variant = variant.as_str(),
            "connected to server"
        );

        Ok(Self {
            pool,
            version,
            variant,
            version_string,
        })
    }

    #[must_use]
    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Detected server version as major.minor.
    #[must_use]
    pub const fn version(&self) -> f64 {
        self.version
    }

    #[must_use]
    pub const fn variant(&self) -> ServerVariant {
        self.variant
    }

    /// The unmodified `SELECT VERSION()` output.
    #[must_use]
    pub fn version_string(&self) -> &str {
        &self.version_string
    }

    /// Handle backed by a lazy pool that never connects; lets orchestration
    /// logic run under test without a live server.
    #[cfg(test)]
    pub(crate) fn stub(version: f64, variant: ServerVariant) -> Self {
        let opts = MySqlConnectOptions::new().host("127.0.0.1").port(3306);

        Self {
            pool: MySqlPoolOptions::new().connect_lazy_with(opts),
            version,
            variant,
            version_string: format!("{version}-stub"),
        }
    }
}
