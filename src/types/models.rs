use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to create a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRepo {
    pub repo_id: String,
    pub project_id: String,
    /// Free text, usually `Full Name <email>`.
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantEntry {
    pub username: String,
    /// Already hashed, in any format Apache's `AuthUserFile` understands.
    pub password: String,
}

/// Access changes for one repository. Grants are applied before revocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifyAccess {
    #[serde(default)]
    pub grant: Vec<GrantEntry>,
    #[serde(default)]
    pub revoke: Vec<String>,
}

/// Stored as `info.yaml` in every repository we create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub app_name: String,
    pub app_version: String,
    pub created_on: DateTime<Utc>,
    pub repo_id: String,
    pub project_id: String,
    pub creator: String,
}
