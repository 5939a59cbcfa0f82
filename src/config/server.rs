use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::StoreOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub listen: String,
    /// Directory holding the sharded repositories and their attic.
    pub repo_root: PathBuf,
    /// Directory Apache includes the per-repository location files from.
    pub apache_config_dir: PathBuf,
    /// URL path under which Apache serves the repositories.
    pub url_prefix: String,
    pub auth_realm: String,
    pub svnadmin: String,
    pub fs_type: String,
    /// Command prefix for controlling Apache; `configtest` or `graceful` is
    /// appended.
    pub apachectl: Vec<String>,
    pub restart_delay_secs: u64,
    pub command_timeout_secs: u64,
    /// Hard limit on graceful shutdown, after which the process exits.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Reads a TOML file. Keys that are absent keep their default.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("unable to read {}: {e}", path.display()))
        })?;
        Self::parse(&contents)
            .map_err(|e| Error::Config(format!("invalid configuration in {}: {e}", path.display())))
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {:?}: {e}", self.listen)))
    }

    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            url_prefix: self.url_prefix.clone(),
            auth_realm: self.auth_realm.clone(),
            ..StoreOptions::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "[::]:8085".to_string(),
            repo_root: PathBuf::from("/media/data/svn"),
            apache_config_dir: PathBuf::from("/etc/apache2/svn"),
            url_prefix: "/repo".to_string(),
            auth_realm: "SVN repository".to_string(),
            svnadmin: "svnadmin".to_string(),
            fs_type: "fsfs".to_string(),
            apachectl: vec![
                "sudo".to_string(),
                "--non-interactive".to_string(),
                "apache2ctl".to_string(),
            ],
            restart_delay_secs: 5,
            command_timeout_secs: 10,
            shutdown_timeout_secs: 17,
        }
    }
}
