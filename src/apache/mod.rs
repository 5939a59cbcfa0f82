//! Control over the Apache instance that serves the repositories.

mod restart;

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::process::{CommandOutput, run_with_timeout};

pub use restart::{NoopRestarter, RestartCoordinator, Restarter};

/// The two web server operations the restart coordinator relies on.
#[async_trait]
pub trait ServerControl: Send + Sync {
    /// Validates the server configuration without touching the running server.
    async fn config_test(&self) -> Result<CommandOutput>;

    /// Reloads the configuration, letting in-flight requests finish.
    async fn graceful_reload(&self) -> Result<CommandOutput>;
}

/// Runs `apache2ctl` (by default through non-interactive sudo).
#[derive(Debug, Clone)]
pub struct ApacheCtl {
    command: Vec<String>,
    timeout: Duration,
}

impl ApacheCtl {
    pub fn new(command: Vec<String>, timeout: Duration) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::Config("apachectl command cannot be empty".to_string()));
        }
        Ok(Self { command, timeout })
    }

    async fn run(&self, subcommand: &str) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).arg(subcommand);
        run_with_timeout(cmd, self.timeout).await
    }
}

#[async_trait]
impl ServerControl for ApacheCtl {
    async fn config_test(&self) -> Result<CommandOutput> {
        self.run("configtest").await
    }

    async fn graceful_reload(&self) -> Result<CommandOutput> {
        self.run("graceful").await
    }
}
