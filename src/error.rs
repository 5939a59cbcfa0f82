use std::fmt;

use thiserror::Error;

/// The two on-disk artifacts that make up a published repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ApacheConfig,
    Repository,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApacheConfig => f.write_str("Apache configuration"),
            Self::Repository => f.write_str("repository"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid repository ID: {0:?}")]
    InvalidRepoId(String),

    #[error("already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("unable to move {artifact} to the attic: {source}")]
    Deletion {
        artifact: Artifact,
        source: std::io::Error,
    },

    #[error("{command} failed: {reason}")]
    ExternalTool {
        command: String,
        reason: String,
        stderr: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not implemented")]
    NotImplemented,
}

pub type Result<T> = std::result::Result<T, Error>;
