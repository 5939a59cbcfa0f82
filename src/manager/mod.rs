//! Repository lifecycle: validation, normalisation and per-repository
//! serialisation on top of the [`RepoStore`].

mod locks;
pub mod validation;

use async_trait::async_trait;

pub use locks::RepoLocks;

use crate::error::{Error, Result};
use crate::store::RepoStore;
use crate::types::{CreateRepo, ModifyAccess};
use validation::{normalize_repo_id, sanitize_creator, validate_grant, validate_project_id};

/// The operations the HTTP API exposes.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Creates a repository and returns its canonical ID.
    async fn create_repo(&self, repo: CreateRepo) -> Result<String>;

    /// Archives a repository. Deleting a nonexistent repository succeeds.
    async fn delete_repo(&self, repo_id: &str) -> Result<()>;

    /// Grants and revokes access, returning the usernames that have access
    /// afterwards.
    async fn modify_access(&self, repo_id: &str, mods: ModifyAccess) -> Result<Vec<String>>;

    async fn get_usernames(&self, repo_id: &str) -> Result<Vec<String>>;

    async fn block_repo(&self, repo_id: &str, blocked: bool) -> Result<()>;
}

/// Subversion repository manager.
pub struct SvnMan {
    store: RepoStore,
    locks: RepoLocks,
}

impl SvnMan {
    pub fn new(store: RepoStore) -> Self {
        Self {
            store,
            locks: RepoLocks::new(),
        }
    }

    pub fn store(&self) -> &RepoStore {
        &self.store
    }
}

#[async_trait]
impl Manager for SvnMan {
    async fn create_repo(&self, repo: CreateRepo) -> Result<String> {
        // "ABCD" and "abcd" are the same repository.
        let repo_id = normalize_repo_id(&repo.repo_id)?;
        validate_project_id(&repo.project_id)?;
        let repo = CreateRepo {
            repo_id,
            creator: sanitize_creator(&repo.creator),
            ..repo
        };

        let _guard = self.locks.lock(&repo.repo_id).await;
        self.store.create_repo(&repo).await?;
        Ok(repo.repo_id)
    }

    async fn delete_repo(&self, repo_id: &str) -> Result<()> {
        let repo_id = normalize_repo_id(repo_id)?;
        let _guard = self.locks.lock(&repo_id).await;
        self.store.delete_repo(&repo_id).await
    }

    async fn modify_access(&self, repo_id: &str, mods: ModifyAccess) -> Result<Vec<String>> {
        let repo_id = normalize_repo_id(repo_id)?;
        for grant in &mods.grant {
            validate_grant(grant)?;
        }

        tracing::info!(
            repo_id = %repo_id,
            grant_count = mods.grant.len(),
            revoke_count = mods.revoke.len(),
            "modifying repository access"
        );

        let _guard = self.locks.lock(&repo_id).await;
        self.store
            .modify_access(&repo_id, &mods.grant, &mods.revoke)
            .await
    }

    async fn get_usernames(&self, repo_id: &str) -> Result<Vec<String>> {
        let repo_id = normalize_repo_id(repo_id)?;
        self.store.usernames(&repo_id).await
    }

    async fn block_repo(&self, repo_id: &str, blocked: bool) -> Result<()> {
        let repo_id = normalize_repo_id(repo_id)?;
        tracing::warn!(repo_id = %repo_id, blocked, "blocking repositories is not implemented");
        Err(Error::NotImplemented)
    }
}
