use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::Result;
use crate::process::{CommandOutput, run_with_timeout};

/// Turns an empty directory into a Subversion repository.
#[async_trait]
pub trait RepoInitializer: Send + Sync {
    async fn create(&self, repo_dir: &Path) -> Result<CommandOutput>;
}

/// Initializes repositories with `svnadmin create`.
#[derive(Debug, Clone)]
pub struct SvnAdmin {
    program: String,
    fs_type: String,
    timeout: Duration,
}

impl SvnAdmin {
    pub fn new(program: impl Into<String>, fs_type: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            fs_type: fs_type.into(),
            timeout,
        }
    }

    fn command(&self, repo_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["create", "--fs-type", self.fs_type.as_str()]).arg(repo_dir);
        cmd
    }
}

impl Default for SvnAdmin {
    fn default() -> Self {
        Self::new("svnadmin", "fsfs", crate::process::DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl RepoInitializer for SvnAdmin {
    async fn create(&self, repo_dir: &Path) -> Result<CommandOutput> {
        run_with_timeout(self.command(repo_dir), self.timeout).await
    }
}
