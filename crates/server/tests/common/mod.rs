//! Common test utilities for in-process API testing.
//!
//! The fixture builds the router over an in-memory dedup store and a shared
//! status handle that tests can mutate directly, so no debrid account or
//! network is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use cachewarmer_core::{load_config_from_str, DedupStore, SqliteDedupStore, WarmerStatus};
use cachewarmer_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use cachewarmer_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[debrid]
api_key = "super-secret-key"

[targets]
movies = ["tt0111161"]

[server]
enabled = true
port = 9090
"#;

/// Test fixture wrapping the API router.
pub struct TestFixture {
    pub router: Router,
    /// Status shared with the router, as the warmer would update it.
    pub status: Arc<RwLock<WarmerStatus>>,
    pub store: Arc<SqliteDedupStore>,
    /// Token the stop endpoint cancels.
    pub shutdown: CancellationToken,
}

/// Response from a test request.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON endpoints.
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");
        let status = Arc::new(RwLock::new(WarmerStatus::default()));
        let store = Arc::new(SqliteDedupStore::in_memory().expect("Failed to create store"));
        let shutdown = CancellationToken::new();

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&status),
            Arc::clone(&store) as Arc<dyn DedupStore>,
            shutdown.clone(),
        ));

        Self {
            router: create_router(state),
            status,
            store,
            shutdown,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

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

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
