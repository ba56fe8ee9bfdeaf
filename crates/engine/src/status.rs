//! Read-side operations plus cancellation and engine stats.

use std::sync::atomic::Ordering;

use chrono::Utc;
use serde::Serialize;
use vizgen_core::batch::{summarize, BatchStatus};
use vizgen_core::job::{Job, ProgressRecord, STEP_CANCELLED};
use vizgen_core::job_events::EVENT_JOB_CANCELLED;
use vizgen_events::JobEvent;

use crate::engine::GenerationEngine;
use crate::error::EngineError;
use crate::registry::StatusCounts;

/// Point-in-time view of the engine for operators.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub running: bool,
    pub worker_count: usize,
    pub queue_depth: usize,
    pub in_flight: usize,
    pub jobs: StatusCounts,
}

impl GenerationEngine {
    /// Snapshot of one job, or `None` if the id is unknown.
    pub async fn job_status(&self, job_id: &str) -> Option<Job> {
        self.shared.registry.get(job_id).await
    }

    /// Current step and progress of one job, or `None` if unknown.
    pub async fn job_progress(&self, job_id: &str) -> Option<ProgressRecord> {
        self.shared.registry.progress(job_id).await
    }

    /// Aggregate status of every job in a campaign.
    ///
    /// An unknown campaign yields an empty, complete status.
    pub async fn campaign_status(&self, campaign_id: &str) -> BatchStatus {
        let jobs = self.shared.registry.campaign_jobs(campaign_id).await;
        summarize(campaign_id, jobs)
    }

    /// Cancel a job that has not been picked up by a worker yet.
    ///
    /// Returns `NotFound` for unknown ids and `Conflict` once the job is
    /// processing or terminal. The queue entry is left in place; the
    /// worker that dequeues it skips it.
    pub async fn cancel_job(&self, job_id: &str) -> Result<Job, EngineError> {
        let job = self
            .shared
            .registry
            .update(job_id, STEP_CANCELLED, |job| job.cancel(Utc::now()))
            .await?;

        tracing::info!(job_id, campaign_id = %job.campaign_id, "Generation job cancelled");
        self.shared
            .events
            .publish(JobEvent::for_job(EVENT_JOB_CANCELLED, &job));
        Ok(job)
    }

    pub async fn stats(&self) -> EngineStats {
        let worker_count = self.worker_count();
        EngineStats {
            running: worker_count > 0,
            worker_count,
            queue_depth: self.shared.queue.depth(),
            in_flight: self.shared.in_flight.load(Ordering::SeqCst),
            jobs: self.shared.registry.status_counts().await,
        }
    }
}
