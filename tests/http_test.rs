//! HTTP routes against an in-memory site and member store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hotpage::config::TemplatesConfig;
use hotpage::http::{self, AppState, TEMPLATE_FAILURE_MESSAGE};
use hotpage::members::{MemberError, MemberRecord, MemberStore, MemberWriter};
use hotpage::site::Site;
use hotpage::templates::TemplateRegistry;
use hotpage::ContentSnapshot;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Default)]
struct MemoryMembers {
    by_email: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl MemberStore for MemoryMembers {
    async fn add(&self, record: MemberRecord) -> Result<(), MemberError> {
        let mut members = self.by_email.lock().unwrap();
        if members.contains_key(&record.email) {
            return Err(MemberError::DuplicateEmail(record.email));
        }
        members.insert(record.email, record.info);
        Ok(())
    }
}

#[async_trait]
impl MemberWriter for MemoryMembers {
    async fn write(&self, record: &MemberRecord) -> Result<(), MemberError> {
        let mut members = self.by_email.lock().unwrap();
        match members.get_mut(&record.email) {
            Some(info) => {
                *info = record.info.clone();
                Ok(())
            }
            None => Err(MemberError::NotFound(record.email.clone())),
        }
    }
}

struct TestApp {
    router: Router,
    members: Arc<MemoryMembers>,
    dir: TempDir,
}

fn app(pairs: &[(&str, &str)]) -> TestApp {
    let dir = TempDir::new().unwrap();
    let snapshot: ContentSnapshot = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let site = Site::new(snapshot, TemplateRegistry::new("section")).shared();
    let members = Arc::new(MemoryMembers::default());

    let templates = TemplatesConfig {
        fallback_dir: dir.path().to_path_buf(),
        ..TemplatesConfig::default()
    };
    let state = AppState::new(site, members.clone(), members.clone(), &templates);
    let static_dirs: Vec<PathBuf> = vec![dir.path().join("css"), dir.path().join("images")];

    TestApp {
        router: http::router(state, &static_dirs),
        members,
        dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_renders_partials_and_ids() {
    let app = app(&[
        (
            "index",
            "<main>{{> section_header}}<button id=\"{{PROFILE_SAVE_BUTTON}}\"></button></main>",
        ),
        ("section_header", "<h1>Hi</h1>"),
    ]);

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "<main><h1>Hi</h1><button id=\"profile-save-button\"></button></main>"
    );
}

#[tokio::test]
async fn test_index_falls_back_to_disk() {
    let app = app(&[("section_header", "<h1>Disk</h1>")]);
    std::fs::write(app.dir.path().join("index.hbs"), "{{> section_header}}").unwrap();

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>Disk</h1>");
}

#[tokio::test]
async fn test_broken_or_missing_index_degrades_to_500() {
    let broken = app(&[("index", "<p>{{NOT_AN_ID}}</p>")]);
    let (status, body) = send(&broken.router, get("/")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, TEMPLATE_FAILURE_MESSAGE);

    let missing = app(&[]);
    let (status, body) = send(&missing.router, get("/")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, TEMPLATE_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_signup_statuses() {
    let app = app(&[]);
    let ada = json!({ "info": "hello", "email": "Ada@Example.org" });

    let (status, _) = send(&app.router, json_request("POST", "/signup", ada.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app.router, json_request("POST", "/signup", ada)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let bad = json!({ "info": "hello", "email": "nope" });
    let (status, _) = send(&app.router, json_request("POST", "/signup", bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = app.members.by_email.lock().unwrap();
    assert_eq!(stored.get("ada@example.org").map(String::as_str), Some("hello"));
}

#[tokio::test]
async fn test_member_update() {
    let app = app(&[]);
    let unknown = json!({ "info": "x", "email": "ghost@example.org" });
    let (status, _) = send(&app.router, json_request("PUT", "/members", unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let signup = json!({ "info": "first", "email": "bob@example.org" });
    send(&app.router, json_request("POST", "/signup", signup)).await;

    let update = json!({ "info": "second", "email": "bob@example.org" });
    let (status, _) = send(&app.router, json_request("PUT", "/members", update)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let stored = app.members.by_email.lock().unwrap();
    assert_eq!(stored.get("bob@example.org").map(String::as_str), Some("second"));
}

#[tokio::test]
async fn test_health_and_static_files() {
    let app = app(&[]);
    let images = app.dir.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("logo.svg"), "<svg/>").unwrap();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"));

    let (status, body) = send(&app.router, get("/logo.svg")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "<svg/>"));

    let (status, _) = send(&app.router, get("/missing.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
