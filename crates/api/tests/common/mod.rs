#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use vizgen_api::config::ServerConfig;
use vizgen_api::router::build_app_router;
use vizgen_api::state::AppState;
use vizgen_engine::{EngineConfig, GenerationEngine};
use vizgen_events::EventBus;
use vizgen_provider::{GenerationError, GenerationOutcome, GenerationRequest, Provider};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

/// Provider that succeeds after `delay` with a URL derived from the job id.
pub struct StubProvider {
    pub delay: Duration,
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(GenerationOutcome {
            result_url: format!("https://cdn.test/{}", request.job_id),
            provider_ref: None,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<GenerationEngine>,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response {
        send(self.router.clone(), Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        send(self.router.clone(), Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> Response {
        send(self.router.clone(), Method::POST, uri, None).await
    }
}

/// Build the full application with an engine whose workers are not started.
pub fn build_test_app(delay: Duration) -> TestApp {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let engine = Arc::new(GenerationEngine::new(
        EngineConfig {
            poll_interval: Duration::from_millis(10),
            ..EngineConfig::default()
        },
        Arc::new(StubProvider { delay }),
        Arc::clone(&event_bus),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::clone(&engine),
        event_bus,
        shutdown: CancellationToken::new(),
    };

    TestApp {
        router: build_app_router(state, &config),
        engine,
    }
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn visuals_body(posts: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "posts": posts,
        "business_context": { "business_name": "Harbor Bakery", "industry": "food" },
        "objective": "awareness",
    })
}

/// Poll the status endpoint until the campaign settles.
pub async fn wait_for_campaign(app: &TestApp, campaign_id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app.get(&format!("/api/v1/campaigns/{campaign_id}/status")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["data"]["is_complete"] == true {
            return json["data"].clone();
        }
        assert!(tokio::time::Instant::now() < deadline, "campaign never completed: {json}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
