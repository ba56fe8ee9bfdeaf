#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vizgen_core::batch::BatchStatus;
use vizgen_core::post::Post;
use vizgen_engine::{EngineConfig, GenerationEngine, SubmitBatch};
use vizgen_events::EventBus;
use vizgen_provider::{GenerationError, GenerationOutcome, GenerationRequest, Provider};

/// In-process provider with scripted behaviour per post id.
#[derive(Default)]
pub struct ScriptedProvider {
    pub delay: Duration,
    /// Post ids whose jobs fail.
    pub fail_posts: HashSet<String>,
    /// Post ids whose jobs panic inside the provider.
    pub panic_posts: HashSet<String>,
    /// Post ids whose jobs return an empty URL.
    pub empty_posts: HashSet<String>,
    /// Post ids whose jobs sleep far past any test timeout.
    pub hang_posts: HashSet<String>,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Job ids in the order the provider saw them.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn post_id(request: &GenerationRequest) -> String {
    request.metadata["post"]["id"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(request.job_id.clone());

        let post = post_id(request);
        if self.hang_posts.contains(&post) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep(self.delay).await;

        if self.panic_posts.contains(&post) {
            panic!("provider exploded on {post}");
        }
        if self.fail_posts.contains(&post) {
            return Err(GenerationError::Rejected(format!("bad prompt for {post}")));
        }
        if self.empty_posts.contains(&post) {
            return Ok(GenerationOutcome {
                result_url: String::new(),
                provider_ref: None,
            });
        }
        Ok(GenerationOutcome {
            result_url: format!(
                "https://cdn.test/{}/{}.{}",
                request.content_type,
                request.job_id,
                request.content_type
            ),
            provider_ref: Some(format!("ref-{}", request.job_id)),
        })
    }
}

/// Engine config tuned for fast tests.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        worker_count: 2,
        poll_interval: Duration::from_millis(10),
        ..EngineConfig::default()
    }
}

pub fn build_engine(provider: Arc<ScriptedProvider>) -> GenerationEngine {
    build_engine_with(test_config(), provider)
}

pub fn build_engine_with(config: EngineConfig, provider: Arc<ScriptedProvider>) -> GenerationEngine {
    GenerationEngine::new(config, provider, Arc::new(EventBus::default()))
}

pub fn image_post(id: &str) -> Post {
    Post::new(id, "text_image").with_field("caption", serde_json::json!(format!("Caption {id}")))
}

pub fn video_post(id: &str) -> Post {
    Post::new(id, "text_video").with_field("caption", serde_json::json!(format!("Clip {id}")))
}

pub fn batch(campaign_id: &str, posts: Vec<Post>) -> SubmitBatch {
    SubmitBatch {
        campaign_id: campaign_id.to_string(),
        posts,
        business_context: serde_json::json!({
            "business_name": "Harbor Bakery",
            "industry": "food",
        }),
        objective: "awareness".to_string(),
    }
}

/// Poll campaign status until every job is terminal, or panic after `limit`.
pub async fn wait_until_complete(
    engine: &GenerationEngine,
    campaign_id: &str,
    limit: Duration,
) -> BatchStatus {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let status = engine.campaign_status(campaign_id).await;
        if status.is_complete {
            return status;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("campaign {campaign_id} did not complete in {limit:?}: {status:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
