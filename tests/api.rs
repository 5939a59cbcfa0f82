//! HTTP API tests, driving the router in-process.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use svnman::apache::{RestartCoordinator, Restarter};
use svnman::server::serve;
use tokio::net::TcpListener;

use common::{CountingApache, TestApp, body_json};

fn create_body(repo_id: &str) -> Value {
    json!({
        "repo_id": repo_id,
        "project_id": "59eefa9cf488554678cae036",
        "creator": "dr. Stüvel <sybren@blender.studio>",
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .request(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_repo() {
    let app = TestApp::new();
    let request = Request::post("/api/repo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(create_body("My-Repo").to_string()))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/repo/my-repo"
    );
    let body = body_json(response).await;
    assert_eq!(body["data"]["repo_id"], "my-repo");
    assert!(body["error"].is_null());

    assert!(app.paths.repo_path("my-repo").join("info.yaml").is_file());
    assert!(app.paths.apache_conf_path("my-repo").is_file());
    assert_eq!(app.restarter.calls(), 1);
}

#[tokio::test]
async fn test_create_repo_conflict() {
    let app = TestApp::new();
    let (status, _) = app.send("POST", "/api/repo", Some(create_body("ABCD"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", "/api/repo", Some(create_body("abcd"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_repo_invalid_id() {
    let app = TestApp::new();
    let (status, body) = app.send("POST", "/api/repo", Some(create_body("ab"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid repository ID"));
    assert_eq!(app.restarter.calls(), 0);
}

#[tokio::test]
async fn test_create_repo_unknown_field() {
    let app = TestApp::new();
    let mut body = create_body("1234");
    body["is_admin"] = json!(true);
    let (status, _) = app.send("POST", "/api/repo", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.paths.repo_path("1234").exists());
}

#[tokio::test]
async fn test_malformed_json() {
    let app = TestApp::new();
    let request = Request::post("/api/repo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"repo_id\": "))
        .unwrap();
    let response = app.request(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::post("/api/repo")
        .body(Body::from(create_body("1234").to_string()))
        .unwrap();
    let response = app.request(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "missing content type");
}

#[tokio::test]
async fn test_access_lifecycle() {
    let app = TestApp::new();
    app.send("POST", "/api/repo", Some(create_body("1234"))).await;

    let (status, body) = app.send("GET", "/api/repo/1234", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"repo_id": "1234", "access": []}));

    let (status, body) = app
        .send(
            "POST",
            "/api/repo/1234/access",
            Some(json!({
                "grant": [
                    {"username": "alice", "password": "h1"},
                    {"username": "bob", "password": "h2"},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["access"], json!(["alice", "bob"]));

    let (status, body) = app
        .send(
            "POST",
            "/api/repo/1234/access",
            Some(json!({"revoke": ["alice"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["access"], json!(["bob"]));

    let (_, body) = app.send("GET", "/api/repo/1234/access", None).await;
    assert_eq!(body["data"]["access"], json!(["bob"]));

    let htpasswd = std::fs::read_to_string(app.paths.htpasswd_path("1234")).unwrap();
    assert_eq!(htpasswd, "bob:h2\n");
    // Access changes take effect without restarting Apache.
    assert_eq!(app.restarter.calls(), 1);
}

#[tokio::test]
async fn test_access_invalid_username() {
    let app = TestApp::new();
    app.send("POST", "/api/repo", Some(create_body("1234"))).await;
    let (status, _) = app
        .send(
            "POST",
            "/api/repo/1234/access",
            Some(json!({"grant": [{"username": "eve:root", "password": "h"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_repo() {
    let app = TestApp::new();
    let (status, _) = app.send("GET", "/api/repo/1234", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("POST", "/api/repo/1234/access", Some(json!({"revoke": ["x"]})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_repo() {
    let app = TestApp::new();
    app.send("POST", "/api/repo", Some(create_body("proj1"))).await;

    let (status, body) = app.send("DELETE", "/api/repo/proj1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(!app.paths.repo_path("proj1").exists());
    assert_eq!(app.restarter.calls(), 2);

    let (status, _) = app.send("GET", "/api/repo/proj1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_nonexistent_repo() {
    let app = TestApp::new();
    let (status, _) = app.send("DELETE", "/api/repo/my-repo-id", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.restarter.calls(), 1);
}

#[tokio::test]
async fn test_not_implemented() {
    let app = TestApp::new();
    app.send("POST", "/api/repo", Some(create_body("1234"))).await;

    for (method, uri) in [
        ("POST", "/api/repo/1234/block"),
        ("GET", "/api/repo/1234/hooks"),
        ("POST", "/api/repo/1234/hooks"),
        ("GET", "/api/hooks"),
    ] {
        let (status, body) = app.send(method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{method} {uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_serve_flushes_queued_restart_on_shutdown() {
    let apache = Arc::new(CountingApache::default());
    let restarter = RestartCoordinator::new(apache.clone(), Duration::from_secs(3600))
        .await
        .unwrap();
    restarter.queue_restart();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve(listener, Router::new(), async {}, &restarter)
        .await
        .unwrap();

    assert_eq!(apache.reloads(), 1);
    assert!(!restarter.is_queued());
}
