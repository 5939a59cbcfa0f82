//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use svnman::apache::{Restarter, ServerControl};
use svnman::error::Result;
use svnman::manager::SvnMan;
use svnman::process::CommandOutput;
use svnman::server::{AppState, create_router};
use svnman::store::{RepoInitializer, RepoPaths, RepoStore, StoreOptions};
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Debug, Default)]
pub struct CountingRestarter {
    calls: AtomicUsize,
}

impl CountingRestarter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Restarter for CountingRestarter {
    fn queue_restart(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Apache whose configuration is always valid; counts graceful reloads.
#[derive(Debug, Default)]
pub struct CountingApache {
    reloads: AtomicUsize,
}

impl CountingApache {
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerControl for CountingApache {
    async fn config_test(&self) -> Result<CommandOutput> {
        Ok(CommandOutput::default())
    }

    async fn graceful_reload(&self) -> Result<CommandOutput> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(CommandOutput::default())
    }
}

/// Stands in for `svnadmin create`.
pub struct FakeSvnAdmin;

#[async_trait]
impl RepoInitializer for FakeSvnAdmin {
    async fn create(&self, repo_dir: &Path) -> Result<CommandOutput> {
        tokio::fs::write(repo_dir.join("format"), "5\n").await?;
        Ok(CommandOutput {
            status: Some(0),
            ..Default::default()
        })
    }
}

pub struct TestApp {
    pub temp: TempDir,
    pub restarter: Arc<CountingRestarter>,
    pub paths: RepoPaths,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let paths = RepoPaths::new(temp.path().join("svn"), temp.path().join("apache"));
        let restarter = Arc::new(CountingRestarter::default());
        let store = RepoStore::new(
            paths.clone(),
            Arc::new(FakeSvnAdmin),
            restarter.clone(),
            StoreOptions::default(),
        );
        let state = Arc::new(AppState::new(Arc::new(SvnMan::new(store))));
        Self {
            temp,
            restarter,
            paths,
            router: create_router(state),
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.request(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    }
}
