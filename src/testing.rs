//! Test doubles shared by the unit tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::apache::Restarter;
use crate::error::{Error, Result};
use crate::process::CommandOutput;
use crate::store::RepoInitializer;

#[derive(Debug, Default)]
pub struct CountingRestarter {
    calls: AtomicUsize,
}

impl CountingRestarter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

impl Restarter for CountingRestarter {
    fn queue_restart(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lays out a minimal FSFS-looking repository instead of running svnadmin.
#[derive(Debug, Default)]
pub struct FakeSvnAdmin {
    pub broken: AtomicBool,
}

#[async_trait]
impl RepoInitializer for FakeSvnAdmin {
    async fn create(&self, repo_dir: &Path) -> Result<CommandOutput> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::ExternalTool {
                command: "svnadmin create".to_string(),
                reason: "exited with exit status: 1".to_string(),
                stderr: "svnadmin: E000013: Can't create directory".to_string(),
            });
        }

        let mut entries = tokio::fs::read_dir(repo_dir).await?;
        if entries.next_entry().await?.is_some() {
            return Err(Error::ExternalTool {
                command: "svnadmin create".to_string(),
                reason: "exited with exit status: 1".to_string(),
                stderr: "svnadmin: E165002: directory is not empty".to_string(),
            });
        }

        tokio::fs::write(repo_dir.join("format"), "5\n").await?;
        tokio::fs::create_dir(repo_dir.join("db")).await?;
        Ok(CommandOutput {
            status: Some(0),
            ..Default::default()
        })
    }
}
