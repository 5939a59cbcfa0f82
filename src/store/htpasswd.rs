//! The per-repository `htpasswd` file that Apache authenticates against.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::files::{PRIVATE_FILE_MODE, write_file};
use crate::types::GrantEntry;

/// Username to password hash mapping, one `username:hash` line per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Htpasswd {
    entries: BTreeMap<String, String>,
}

impl Htpasswd {
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((username, hash)) => {
                    entries.insert(username.to_string(), hash.to_string());
                }
                None => tracing::warn!("skipping malformed htpasswd line"),
            }
        }
        Self { entries }
    }

    /// Reads the file at `path`, passing on "not found" to the caller.
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    /// Like [`Htpasswd::load`], but a missing file is an empty mapping.
    pub async fn load_or_default(path: &Path) -> std::io::Result<Self> {
        match Self::load(path).await {
            Ok(htpasswd) => Ok(htpasswd),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn grant(&mut self, username: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(username.into(), hash.into());
    }

    /// Returns whether the user had access.
    pub fn revoke(&mut self, username: &str) -> bool {
        self.entries.remove(username).is_some()
    }

    pub fn get(&self, username: &str) -> Option<&str> {
        self.entries.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Usernames in sorted order.
    #[must_use]
    pub fn usernames(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(username, hash)| format!("{username}:{hash}\n"))
            .collect()
    }

    /// Replaces the file at `path` with this mapping.
    ///
    /// The content goes to a temporary file next to it first, which is then
    /// renamed over the original, so Apache never sees a half-written file.
    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        let temp_path = temp_path(path);
        let result = write_file(&temp_path, self.render().as_bytes(), PRIVATE_FILE_MODE).await;
        let result = match result {
            Ok(()) => fs::rename(&temp_path, path).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        result
    }
}

/// Applies grants, then revocations, to the file at `path` in a single
/// rewrite. A missing file counts as an empty one.
pub async fn modify_access(
    path: &Path,
    grants: &[GrantEntry],
    revocations: &[String],
) -> std::io::Result<Htpasswd> {
    let mut htpasswd = Htpasswd::load_or_default(path).await?;

    for grant in grants {
        htpasswd.grant(&grant.username, &grant.password);
    }
    for username in revocations {
        if !htpasswd.revoke(username) {
            tracing::debug!("revoking access for {username:?}, who had no access");
        }
    }

    htpasswd.save(path).await?;
    Ok(htpasswd)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
}
