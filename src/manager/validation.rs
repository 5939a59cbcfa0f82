use crate::error::{Error, Result};
use crate::types::GrantEntry;

const MIN_REPO_ID_LEN: usize = 4;
const MAX_PROJECT_ID_LEN: usize = 64;

/// Characters allowed in the creator field besides letters and digits.
const CREATOR_PUNCTUATION: &[char] = &['_', '-', '.', ',', ' ', '@', '<', '>', '\'', '(', ')', '+'];

/// Returns true iff the repository ID is safe to use as repository name,
/// path component and URL segment: at least four characters, ASCII
/// alphanumerics plus `-` and `_`, starting and ending alphanumeric.
#[must_use]
pub fn valid_repo_id(repo_id: &str) -> bool {
    if repo_id.len() < MIN_REPO_ID_LEN {
        return false;
    }

    let bytes = repo_id.as_bytes();
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Validates the repository ID and returns its canonical, lower-case form.
pub fn normalize_repo_id(repo_id: &str) -> Result<String> {
    if !valid_repo_id(repo_id) {
        return Err(Error::InvalidRepoId(repo_id.to_string()));
    }
    Ok(repo_id.to_ascii_lowercase())
}

pub fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.is_empty() {
        return Err(Error::BadRequest("project ID cannot be empty".to_string()));
    }
    if project_id.len() > MAX_PROJECT_ID_LEN {
        return Err(Error::BadRequest(format!(
            "project ID cannot exceed {MAX_PROJECT_ID_LEN} characters"
        )));
    }
    if !project_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::BadRequest(
            "project ID can only contain alphanumeric characters, hyphens, and underscores"
                .to_string(),
        ));
    }
    Ok(())
}

fn is_creator_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || CREATOR_PUNCTUATION.contains(&c)
}

/// Replaces every run of disallowed characters with a single space.
///
/// The creator ends up in `info.yaml` and in a comment in the Apache
/// configuration, so newlines, quotes and the like must not survive.
#[must_use]
pub fn sanitize_creator(creator: &str) -> String {
    let mut sanitized = String::with_capacity(creator.len());
    let mut in_bad_run = false;
    for c in creator.chars() {
        if is_creator_char(c) {
            sanitized.push(c);
            in_bad_run = false;
        } else if !in_bad_run {
            sanitized.push(' ');
            in_bad_run = true;
        }
    }
    sanitized.trim().to_string()
}

/// Each grant becomes one `username:hash` line in the htpasswd file.
pub fn validate_grant(grant: &GrantEntry) -> Result<()> {
    validate_username(&grant.username)?;
    if grant.password.is_empty() {
        return Err(Error::BadRequest(format!(
            "password hash for {:?} cannot be empty",
            grant.username
        )));
    }
    if grant.password.chars().any(char::is_control) {
        return Err(Error::BadRequest(format!(
            "password hash for {:?} contains invalid characters",
            grant.username
        )));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::BadRequest("username cannot be empty".to_string()));
    }
    if username
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err(Error::BadRequest(format!(
            "username {username:?} contains invalid characters"
        )));
    }
    Ok(())
}
