use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

const ATTIC_DIR: &str = "attic";

/// Returns the first two characters of a repository ID, used as an
/// intermediate directory to limit the number of entries per directory.
///
/// Repository IDs are validated to be at least four ASCII characters long
/// before any path is derived from them.
#[must_use]
pub fn shard(repo_id: &str) -> &str {
    let end = repo_id
        .char_indices()
        .nth(2)
        .map_or(repo_id.len(), |(idx, _)| idx);
    &repo_id[..end]
}

/// Timestamp suffix for attic entries. Sorts chronologically and avoids
/// colons, which are not allowed in file names everywhere.
#[must_use]
pub fn attic_stamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H-%M-%S%.9fZ").to_string()
}

/// Canonical locations of everything that belongs to a repository.
#[derive(Debug, Clone)]
pub struct RepoPaths {
    repo_root: PathBuf,
    apache_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(repo_root: impl Into<PathBuf>, apache_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            apache_dir: apache_dir.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn apache_dir(&self) -> &Path {
        &self.apache_dir
    }

    #[must_use]
    pub fn repo_path(&self, repo_id: &str) -> PathBuf {
        self.repo_root.join(shard(repo_id)).join(repo_id)
    }

    #[must_use]
    pub fn info_path(&self, repo_id: &str) -> PathBuf {
        self.repo_path(repo_id).join("info.yaml")
    }

    #[must_use]
    pub fn htpasswd_path(&self, repo_id: &str) -> PathBuf {
        self.repo_path(repo_id).join("htpasswd")
    }

    #[must_use]
    pub fn apache_conf_path(&self, repo_id: &str) -> PathBuf {
        self.apache_dir
            .join(shard(repo_id))
            .join(apache_conf_name(repo_id))
    }

    #[must_use]
    pub fn attic_repo_path(&self, repo_id: &str, timestamp: DateTime<Utc>) -> PathBuf {
        self.repo_root
            .join(ATTIC_DIR)
            .join(shard(repo_id))
            .join(format!("{repo_id}-{}", attic_stamp(timestamp)))
    }

    #[must_use]
    pub fn attic_apache_conf_path(&self, repo_id: &str, timestamp: DateTime<Utc>) -> PathBuf {
        self.apache_dir
            .join(ATTIC_DIR)
            .join(shard(repo_id))
            .join(format!(
                "{}-{}",
                apache_conf_name(repo_id),
                attic_stamp(timestamp)
            ))
    }
}

fn apache_conf_name(repo_id: &str) -> String {
    format!("svn-{repo_id}.conf")
}
