//! Batch submission: validate posts, expand them into jobs, enqueue.

use serde::Deserialize;
use vizgen_core::content::required_content_types;
use vizgen_core::job::{Job, NewJob};
use vizgen_core::job_events::EVENT_JOB_QUEUED;
use vizgen_core::post::{validate_campaign_id, validate_posts, Post};
use vizgen_events::JobEvent;

use crate::engine::GenerationEngine;
use crate::error::EngineError;

/// A batch of posts to generate visuals for.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBatch {
    pub campaign_id: String,
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Opaque business description handed to the prompt builder.
    #[serde(default)]
    pub business_context: serde_json::Value,
    #[serde(default)]
    pub objective: String,
}

impl GenerationEngine {
    /// Create one queued job per required visual and enqueue them all.
    ///
    /// Validation runs over the whole batch first; a malformed post fails
    /// the call without creating any job. Posts whose type needs no
    /// visual contribute nothing, so the result may be empty. Returns the
    /// jobs in post order, image before video within a post.
    pub async fn submit(&self, batch: SubmitBatch) -> Result<Vec<Job>, EngineError> {
        validate_campaign_id(&batch.campaign_id)?;
        validate_posts(&batch.posts)?;

        let estimates = self.shared.config.estimates;
        let mut jobs = Vec::new();

        for post in &batch.posts {
            let content_types = required_content_types(&post.post_type);
            if content_types.is_empty() {
                continue;
            }

            let prompt =
                self.prompt_builder
                    .build_prompt(post, &batch.business_context, &batch.objective);
            let metadata = serde_json::json!({
                "business_context": batch.business_context,
                "objective": batch.objective,
                "post": post,
            });

            for &content_type in content_types {
                jobs.push(Job::queued(NewJob {
                    campaign_id: batch.campaign_id.clone(),
                    post_id: post.id.clone(),
                    content_type,
                    prompt: prompt.clone(),
                    estimated_completion_seconds: estimates.estimate_secs(content_type),
                    metadata: metadata.clone(),
                }));
            }
        }

        if jobs.is_empty() {
            tracing::debug!(
                campaign_id = %batch.campaign_id,
                post_count = batch.posts.len(),
                "No posts in batch need visuals",
            );
            return Ok(jobs);
        }

        // Registered before enqueue so a worker never dequeues an unknown id.
        self.shared.registry.insert_batch(&jobs).await?;
        for job in &jobs {
            self.shared.queue.push(job.job_id.clone())?;
            self.shared
                .events
                .publish(JobEvent::for_job(EVENT_JOB_QUEUED, job));
        }

        tracing::info!(
            campaign_id = %batch.campaign_id,
            post_count = batch.posts.len(),
            job_count = jobs.len(),
            "Queued generation jobs",
        );
        Ok(jobs)
    }
}
