use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RepoCreatedResponse {
    pub repo_id: String,
}

#[derive(Debug, Serialize)]
pub struct RepoAccessResponse {
    pub repo_id: String,
    /// Usernames with access, sorted.
    pub access: Vec<String>,
}
