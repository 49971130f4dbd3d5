//! Shared test helpers
//!
//! - In-memory database with the settings table
//! - `ScriptedBackend`: records every request, answers per task
//! - App builders wired to either backend

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bb_coach::error::AnalysisFailure;
use bb_coach::models::Frame;
use bb_coach::services::vision_client::{
    CompletionContent, Credential, VisionBackend, VisionRequest, VisionTask,
};
use bb_coach::store::LocalStore;
use bb_coach::{build_router, AppState};
use bb_common::config::TomlConfig;
use bb_common::events::EventBus;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Smallest byte prefix `infer` recognizes as PNG
pub const PNG_BYTES: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// JPEG SOI + APP0 marker
pub const JPEG_BYTES: [u8; 12] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
];

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    bb_common::db::init::create_settings_table(&pool).await.unwrap();
    pool
}

pub fn png_frame(name: &str) -> Frame {
    Frame::new(name, "image/png", PNG_BYTES.to_vec())
}

pub fn credential() -> Credential {
    Credential::new("gsk_test_key").unwrap()
}

/// Backend answering from a script
pub struct ScriptedBackend {
    requests: Mutex<Vec<VisionRequest>>,
    failing_steps: HashSet<usize>,
    aggregate: Result<CompletionContent, AnalysisFailure>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failing_steps: HashSet::new(),
            aggregate: Ok(CompletionContent::Structured(json!({
                "overall": "Consistent tempo.",
                "subscores": { "timing": 88, "balance": 80 }
            }))),
            delay: None,
        }
    }

    /// Sleep this long before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_step(mut self, step_index: usize) -> Self {
        self.failing_steps.insert(step_index);
        self
    }

    pub fn aggregate_reply(mut self, reply: Result<CompletionContent, AnalysisFailure>) -> Self {
        self.aggregate = reply;
        self
    }

    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tasks(&self) -> Vec<VisionTask> {
        self.requests().into_iter().map(|r| r.task).collect()
    }
}

#[async_trait]
impl VisionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &VisionRequest,
    ) -> Result<CompletionContent, AnalysisFailure> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match request.task {
            VisionTask::Step { index } if self.failing_steps.contains(&index) => {
                Err(AnalysisFailure::HttpStatus {
                    status: 500,
                    body: "upstream exploded".to_string(),
                })
            }
            VisionTask::Step { index } => Ok(CompletionContent::Text(format!(
                "Feedback for step {}",
                index + 1
            ))),
            VisionTask::Aggregate => self.aggregate.clone(),
            VisionTask::Release => Ok(CompletionContent::Structured(json!({
                "overall": "Firm wrist.",
                "metrics": { "overallScore": 81 }
            }))),
            VisionTask::KeyCheck => {
                Ok(CompletionContent::Text("API key test successful.".to_string()))
            }
            VisionTask::Question => Ok(CompletionContent::Text(format!(
                "Answer: {}",
                request.instruction
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
}

/// App with the given backend and an optional stored credential
pub async fn test_app(backend: Arc<dyn VisionBackend>, api_key: Option<&str>) -> TestApp {
    let pool = test_pool().await;
    let store = LocalStore::new(pool.clone(), TomlConfig::default(), None);
    if let Some(key) = api_key {
        store.set_credential(key).await.unwrap();
    }

    let state = AppState::new(store, EventBus::new(100), backend);
    TestApp {
        router: build_router(state.clone()),
        state,
        pool,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "bowlbetter-test-boundary";

/// multipart/form-data request with one part per `(file name, content type, bytes)`
pub fn multipart_request(uri: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    form_request(uri, &[], files)
}

/// multipart/form-data request with text fields followed by file parts
pub fn form_request(
    uri: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n\
                 Content-Type: {}\r\n\r\n",
                file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

/// GET `uri` and decode the JSON body
pub async fn get_json(router: &Router, uri: &str) -> Value {
    use tower::ServiceExt;

    let response = router.clone().oneshot(empty_request("GET", uri)).await.unwrap();
    body_json(response).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
