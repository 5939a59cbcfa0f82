use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::server::AppState;
use crate::server::dto::{RepoAccessResponse, RepoCreatedResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{CreateRepo, ModifyAccess};

pub fn repo_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/repo", post(create_repo))
        .route("/repo/{repo_id}", get(get_repo).delete(delete_repo))
        .route("/repo/{repo_id}/access", get(get_repo).post(modify_access))
        .route("/repo/{repo_id}/block", post(block_repo))
        .route("/repo/{repo_id}/hooks", get(not_implemented).post(not_implemented))
        .route("/hooks", get(not_implemented))
}

pub async fn create_repo(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRepo>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let repo_id = state.manager.create_repo(req).await?;

    tracing::info!("created repository {repo_id}");
    let location = format!("/api/repo/{repo_id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::success(RepoCreatedResponse { repo_id })),
    ))
}

pub async fn get_repo(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.manager.get_usernames(&repo_id).await?;
    Ok(Json(ApiResponse::success(RepoAccessResponse {
        repo_id: repo_id.to_ascii_lowercase(),
        access,
    })))
}

pub async fn delete_repo(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.manager.delete_repo(&repo_id).await?;
    tracing::info!("deleted repository {repo_id}");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn modify_access(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
    payload: Result<Json<ModifyAccess>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mods) = payload?;
    let access = state.manager.modify_access(&repo_id, mods).await?;
    Ok(Json(ApiResponse::success(RepoAccessResponse {
        repo_id: repo_id.to_ascii_lowercase(),
        access,
    })))
}

pub async fn block_repo(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.block_repo(&repo_id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_implemented() -> ApiError {
    ApiError::not_implemented("Not implemented")
}
