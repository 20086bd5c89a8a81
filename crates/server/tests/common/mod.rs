//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the real router around a
//! small orchestrator, so requests run through the full handler stack without
//! binding a socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskproc_core::{Config, OrchestratorConfig, ServerConfig, TaskOrchestrator};
use taskproc_server::state::AppState;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_task_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/task/create", json!({
///         "title": "Factorial",
///         "data": { "type": "calculation", "input": 5, "operation": "factorial" }
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// The orchestrator behind the router
    pub orchestrator: Arc<TaskOrchestrator>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a running fixture with 2 workers x 2 threads.
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig {
            num_workers: 2,
            threads_per_worker: 2,
        })
    }

    /// Create a running fixture with custom orchestrator sizing.
    pub fn with_config(orchestrator_config: OrchestratorConfig) -> Self {
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 7000, // Not used for in-process testing
            },
            orchestrator: orchestrator_config.clone(),
        };

        let orchestrator = Arc::new(
            TaskOrchestrator::new(orchestrator_config).expect("Failed to create orchestrator"),
        );
        orchestrator.start().expect("Failed to start orchestrator");

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = taskproc_server::api::create_router(state);

        Self {
            router,
            orchestrator,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request and return the raw body text (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Create a calculation task and return its id.
    pub async fn create_calculation(&self, id: &str, operation: &str, input: i64) -> String {
        let response = self
            .post(
                "/task/create",
                json!({
                    "id": id,
                    "title": format!("{} {}", operation, input),
                    "priority": 2,
                    "data": { "type": "calculation", "input": input, "operation": operation }
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "create failed: {}", response.body);
        response.body["task_id"].as_str().unwrap().to_string()
    }

    /// Poll `GET /task/{id}` until the task has a result or reaches a terminal status.
    pub async fn wait_for_processing(&self, id: &str) -> Value {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let response = self.get(&format!("/task/{}", id)).await;
            assert_eq!(response.status, StatusCode::OK);
            let status = response.body["status"].as_str().unwrap_or_default();
            if response.body.get("result").is_some() || status == "completed" || status == "failed"
            {
                return response.body;
            }
            assert!(Instant::now() < deadline, "Task {} never processed", id);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        self.orchestrator.stop();
    }
}
