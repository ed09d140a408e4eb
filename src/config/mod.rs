//! Credential and target configuration.
//!
//! Credentials come from a `.my.cnf`-style key/value file read at startup
//! and on `POST /-/reload`. The active snapshot lives behind an `ArcSwap`:
//! requests read a consistent snapshot, a reload swaps it atomically, and a
//! failed reload leaves the previous snapshot in effect.

use anyhow::{Context, Result, anyhow};
use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use sqlx::mysql::MySqlConnectOptions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Password fallback when the config file has none.
const PASSWORD_ENV: &str = "MYSQLD_EXPORTER_PASSWORD";

const DEFAULT_PORT: u16 = 3306;

/// One resolved `[client]` credential set.
#[derive(Debug)]
pub struct Client {
    user: String,
    password: SecretString,
    host: String,
    port: u16,
    socket: Option<String>,
}

impl Client {
    /// Build connect options for this credential set.
    ///
    /// A non-empty `target` overrides the configured host and port (the
    /// `?target=` query parameter); otherwise the configured socket, or
    /// host and port, are used.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is not a valid `host`, `host:port`, or
    /// `[ipv6]:port`.
    pub fn connect_options(&self, target: Option<&str>) -> Result<MySqlConnectOptions> {
        let mut opts = MySqlConnectOptions::new()
            .username(&self.user)
            .password(self.password.expose_secret());

        match target {
            Some(target) if !target.is_empty() => {
                let (host, port) = split_host_port(target)?;
                opts = opts.host(&host).port(port);
            }
            _ => {
                if let Some(socket) = &self.socket {
                    opts = opts.socket(socket);
                } else {
                    opts = opts.host(&self.host).port(self.port);
                }
            }
        }

        Ok(opts)
    }
}

/// Holds the active credential snapshot and the inputs needed to re-read it.
pub struct ConfigHandler {
    path: PathBuf,
    address: String,
    user: Option<String>,
    current: ArcSwap<Client>,
}

impl ConfigHandler {
    /// Read the config file and build the initial snapshot.
    ///
    /// `address` (`host:port`) and `user` are the CLI-provided defaults for
    /// keys the file does not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or yields no usable
    /// `[client]` credentials.
    pub fn load(
        path: impl Into<PathBuf>,
        address: impl Into<String>,
        user: Option<String>,
    ) -> Result<Self> {
        let path = path.into();
        let address = address.into();
        let client = read_config(&path, &address, user.as_deref())?;

        Ok(Self {
            path,
            address,
            user,
            current: ArcSwap::from_pointee(client),
        })
    }

    /// Re-read the config file and swap the snapshot atomically.
    ///
    /// Requests already holding the previous snapshot are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or validated; the
    /// previous snapshot stays in effect.
    pub fn reload(&self) -> Result<()> {
        let client = read_config(&self.path, &self.address, self.user.as_deref())?;
        self.current.store(Arc::new(client));
        info!(path = %self.path.display(), "client configuration reloaded");
        Ok(())
    }

    /// The active credential snapshot.
    #[must_use]
    pub fn client(&self) -> Arc<Client> {
        self.current.load_full()
    }
}

fn read_config(path: &Path, address: &str, user: Option<&str>) -> Result<Client> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    parse_my_cnf(&content, address, user)
}

fn parse_my_cnf(content: &str, address: &str, default_user: Option<&str>) -> Result<Client> {
    let sections = parse_sections(content);
    let client = sections
        .get("client")
        .ok_or_else(|| anyhow!("no [client] section found in config file"))?;

    let user = client
        .get("user")
        .map(String::as_str)
        .or(default_user)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow!("no user specified in [client] or --mysqld.username"))?
        .to_string();

    let password = client
        .get("password")
        .cloned()
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            anyhow!("no password specified in [client] or {PASSWORD_ENV} environment variable")
        })?;

    let (default_host, default_port) = split_host_port(address)?;
    let host = client.get("host").cloned().unwrap_or(default_host);
    let port = client
        .get("port")
        .map(|p| p.parse::<u16>().with_context(|| format!("invalid port {p:?}")))
        .transpose()?
        .unwrap_or(default_port);

    Ok(Client {
        user,
        password: SecretString::from(password),
        host,
        port,
        socket: client.get("socket").cloned(),
    })
}

fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = name.trim().to_ascii_lowercase();
            sections.entry(current.clone()).or_default();
            continue;
        }

        if current.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            sections
                .entry(current.clone())
                .or_default()
                .insert(key, value);
        }
    }

    sections
}

fn split_host_port(target: &str) -> Result<(String, u16)> {
    // Bracketed IPv6: [::1]:3306
    if let Some(rest) = target.strip_prefix('[') {
        let (host, port) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid target {target:?}"))?;
        let port = port
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing port in target {target:?}"))?;
        let port = port
            .parse::<u16>()
            .with_context(|| format!("invalid port in target {target:?}"))?;
        return Ok((host.to_string(), port));
    }

    if let Some((host, port)) = target.rsplit_once(':') {
        // More than one colon without brackets means a bare IPv6 address.
        if !host.contains(':') {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("invalid port in target {target:?}"))?;
            return Ok((host.to_string(), port));
        }
    }

    Ok((target.to_string(), DEFAULT_PORT))
}
