mod engine;
mod files;
pub mod htpasswd;
pub mod path;

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;

pub use engine::{RepoInitializer, SvnAdmin};
pub use htpasswd::Htpasswd;
pub use path::RepoPaths;

use crate::apache::Restarter;
use crate::error::{Artifact, Error, Result};
use crate::types::{CreateRepo, GrantEntry, RepoInfo};
use files::{PRIVATE_FILE_MODE, PUBLIC_FILE_MODE, create_dir_all, write_file};

/// Values that end up in generated files but are not part of a request.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub app_name: String,
    pub app_version: String,
    /// URL path under which Apache serves the repositories.
    pub url_prefix: String,
    /// Prefix of the Basic authentication realm shown to users.
    pub auth_realm: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            app_name: crate::APP_NAME.to_string(),
            app_version: crate::APP_VERSION.to_string(),
            url_prefix: "/repo".to_string(),
            auth_realm: "SVN repository".to_string(),
        }
    }
}

/// Owns the repository root and the Apache configuration directory.
///
/// Repository IDs passed in here must already be validated and lower-cased.
pub struct RepoStore {
    paths: RepoPaths,
    engine: Arc<dyn RepoInitializer>,
    restarter: Arc<dyn Restarter>,
    options: StoreOptions,
}

impl RepoStore {
    pub fn new(
        paths: RepoPaths,
        engine: Arc<dyn RepoInitializer>,
        restarter: Arc<dyn Restarter>,
        options: StoreOptions,
    ) -> Self {
        tracing::info!(
            repo_root = %paths.repo_root().display(),
            apache = %paths.apache_dir().display(),
            "creating repository store"
        );
        Self {
            paths,
            engine,
            restarter,
            options,
        }
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    pub async fn exists(&self, repo_id: &str) -> Result<bool> {
        Ok(fs::try_exists(self.paths.repo_path(repo_id)).await?)
    }

    /// Creates the repository, its info and htpasswd files, and the Apache
    /// location directive, then queues an Apache restart.
    ///
    /// Nothing is rolled back on failure. A partially created repository is
    /// not reachable, because its Apache configuration is written last.
    pub async fn create_repo(&self, repo: &CreateRepo) -> Result<()> {
        let repo_id = repo.repo_id.as_str();
        let repo_dir = self.paths.repo_path(repo_id);
        let htpasswd = self.paths.htpasswd_path(repo_id);
        let apache_conf = self.paths.apache_conf_path(repo_id);

        if fs::try_exists(&repo_dir).await? {
            tracing::warn!(repo_id, "repository already exists");
            return Err(Error::AlreadyExists);
        }

        tracing::info!(
            repo_id,
            project_id = %repo.project_id,
            creator = %repo.creator,
            repo_dir = %repo_dir.display(),
            apache_file = %apache_conf.display(),
            "going to create repository"
        );
        create_dir_all(&repo_dir).await?;

        // svnadmin refuses to create a repository in a non-empty directory,
        // so it has to run before we write anything in there.
        let output = self.engine.create(&repo_dir).await.inspect_err(|e| {
            tracing::warn!(repo_id, "error running svnadmin: {e}");
        })?;
        tracing::debug!(repo_id, stdout = %output.stdout.trim(), "'svnadmin create' successful");

        let info = RepoInfo {
            app_name: self.options.app_name.clone(),
            app_version: self.options.app_version.clone(),
            created_on: Utc::now(),
            repo_id: repo.repo_id.clone(),
            project_id: repo.project_id.clone(),
            creator: repo.creator.clone(),
        };
        let info_yaml = serde_yaml::to_string(&info)?;
        write_file(
            &self.paths.info_path(repo_id),
            info_yaml.as_bytes(),
            PUBLIC_FILE_MODE,
        )
        .await?;

        write_file(&htpasswd, b"", PRIVATE_FILE_MODE).await?;

        if let Some(parent) = apache_conf.parent() {
            create_dir_all(parent).await?;
        }
        let conf = self.render_apache_conf(repo, &repo_dir, &htpasswd);
        write_file(&apache_conf, conf.as_bytes(), PUBLIC_FILE_MODE).await?;

        tracing::debug!(repo_id, "repository created, requesting Apache restart");
        self.restarter.queue_restart();
        Ok(())
    }

    /// Moves the Apache configuration and the repository into the attic and
    /// queues an Apache restart.
    ///
    /// Missing files are skipped, so deleting a nonexistent repository
    /// succeeds (and still restarts Apache).
    pub async fn delete_repo(&self, repo_id: &str) -> Result<()> {
        let now = Utc::now();
        let apache_conf = self.paths.apache_conf_path(repo_id);
        let apache_attic = self.paths.attic_apache_conf_path(repo_id, now);
        let repo_dir = self.paths.repo_path(repo_id);
        let repo_attic = self.paths.attic_repo_path(repo_id, now);

        tracing::debug!(
            repo_id,
            apache_conf = %apache_conf.display(),
            apache_attic = %apache_attic.display(),
            repo = %repo_dir.display(),
            attic = %repo_attic.display(),
            "deleting repository"
        );

        ensure_attic(&repo_attic, Artifact::Repository).await?;
        ensure_attic(&apache_attic, Artifact::ApacheConfig).await?;

        // Apache configuration goes first. Once it is gone the repository is
        // unreachable, even when moving the repository itself fails.
        let conf_moved = move_to_attic(&apache_conf, &apache_attic, Artifact::ApacheConfig).await?;
        let repo_moved = move_to_attic(&repo_dir, &repo_attic, Artifact::Repository).await?;
        if conf_moved != repo_moved {
            tracing::warn!(
                repo_id,
                conf_moved,
                repo_moved,
                "repository was only partially present, archived what was left"
            );
        }

        self.restarter.queue_restart();
        tracing::info!(repo_id, "repository deleted");
        Ok(())
    }

    /// Returns the usernames with access to the repository, sorted.
    pub async fn usernames(&self, repo_id: &str) -> Result<Vec<String>> {
        match Htpasswd::load(&self.paths.htpasswd_path(repo_id)).await {
            Ok(htpasswd) => Ok(htpasswd.usernames()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the repository's htpasswd file and returns the resulting
    /// usernames. Apache reads the file on every request, so no restart is
    /// needed.
    pub async fn modify_access(
        &self,
        repo_id: &str,
        grants: &[GrantEntry],
        revocations: &[String],
    ) -> Result<Vec<String>> {
        if !self.exists(repo_id).await? {
            return Err(Error::NotFound);
        }

        let htpasswd = htpasswd::modify_access(
            &self.paths.htpasswd_path(repo_id),
            grants,
            revocations,
        )
        .await?;
        Ok(htpasswd.usernames())
    }

    fn render_apache_conf(&self, repo: &CreateRepo, repo_dir: &Path, htpasswd: &Path) -> String {
        let url_prefix = self.options.url_prefix.trim_end_matches('/');
        let realm = format!("{} {:?}", self.options.auth_realm, repo.repo_id);
        format!(
            "# Location directive for project {project:?}, created by {creator:?}\n\
             <Location {url_prefix}/{repo_id}>\n\
             \x20   DAV svn\n\
             \x20   SVNPath {repo_dir}\n\
             \x20   AuthType Basic\n\
             \x20   AuthName {realm:?}\n\
             \x20   AuthUserFile {htpasswd}\n\
             \x20   Require valid-user\n\
             </Location>\n",
            project = repo.project_id,
            creator = repo.creator,
            repo_id = repo.repo_id,
            repo_dir = repo_dir.display(),
            htpasswd = htpasswd.display(),
        )
    }
}

async fn ensure_attic(attic_path: &Path, artifact: Artifact) -> Result<()> {
    let Some(parent) = attic_path.parent() else {
        return Ok(());
    };
    create_dir_all(parent).await.map_err(|source| {
        tracing::error!(path = %parent.display(), "unable to create attic for {artifact}: {source}");
        Error::Deletion { artifact, source }
    })
}

/// Returns whether there was anything to move.
async fn move_to_attic(from: &Path, to: &Path, artifact: Artifact) -> Result<bool> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %from.display(), "trying to remove non-existent {artifact}");
            Ok(false)
        }
        Err(source) => {
            tracing::error!(path = %from.display(), "unable to move {artifact} to attic: {source}");
            Err(Error::Deletion { artifact, source })
        }
    }
}
