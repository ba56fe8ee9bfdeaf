//! Campaign-level rollup of job snapshots.
//!
//! [`summarize`] is a pure function over a slice of jobs. Callers take
//! the snapshot under a single read lock so the counts it reports always
//! add up to `total_jobs`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::ContentType;
use crate::job::{Job, JobStatus};

/// Visual URLs generated for one post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostVisuals {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// Derived status of every job in a campaign. Computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    pub campaign_id: String,
    pub total_jobs: usize,
    pub queued_jobs: usize,
    pub processing_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub cancelled_jobs: usize,
    /// Mean progress across all jobs, in `0.0..=1.0`.
    pub overall_progress: f64,
    pub jobs: Vec<Job>,
    /// Completed visuals keyed by post id. Posts with none are omitted.
    pub posts_with_visuals: BTreeMap<String, PostVisuals>,
    /// True once no job can change any more.
    pub is_complete: bool,
    /// Mean remaining seconds over processing jobs; `None` if none run.
    pub estimated_completion_seconds: Option<u32>,
}

/// Build a [`BatchStatus`] from a snapshot of a campaign's jobs.
pub fn summarize(campaign_id: &str, jobs: Vec<Job>) -> BatchStatus {
    let mut queued_jobs = 0;
    let mut processing_jobs = 0;
    let mut completed_jobs = 0;
    let mut failed_jobs = 0;
    let mut cancelled_jobs = 0;

    for job in &jobs {
        match job.status {
            JobStatus::Queued => queued_jobs += 1,
            JobStatus::Processing => processing_jobs += 1,
            JobStatus::Completed => completed_jobs += 1,
            JobStatus::Failed => failed_jobs += 1,
            JobStatus::Cancelled => cancelled_jobs += 1,
        }
    }

    let total_jobs = jobs.len();
    let overall_progress = if total_jobs == 0 {
        0.0
    } else {
        let sum: f64 = jobs.iter().map(|j| j.progress.clamp(0.0, 1.0)).sum();
        (sum / total_jobs as f64).clamp(0.0, 1.0)
    };

    BatchStatus {
        campaign_id: campaign_id.to_string(),
        total_jobs,
        queued_jobs,
        processing_jobs,
        completed_jobs,
        failed_jobs,
        cancelled_jobs,
        overall_progress,
        posts_with_visuals: collect_visuals(&jobs),
        is_complete: completed_jobs + failed_jobs + cancelled_jobs == total_jobs,
        estimated_completion_seconds: estimate_remaining(&jobs),
        jobs,
    }
}

/// Group completed jobs' result URLs by post.
fn collect_visuals(jobs: &[Job]) -> BTreeMap<String, PostVisuals> {
    let mut visuals: BTreeMap<String, PostVisuals> = BTreeMap::new();
    for job in jobs.iter().filter(|j| j.status == JobStatus::Completed) {
        let Some(url) = &job.result_url else {
            continue;
        };
        let entry = visuals.entry(job.post_id.clone()).or_default();
        match job.content_type {
            ContentType::Image => entry.image_url = Some(url.clone()),
            ContentType::Video => entry.video_url = Some(url.clone()),
        }
    }
    visuals
}

/// Average of `estimate * (1 - progress)` over processing jobs.
fn estimate_remaining(jobs: &[Job]) -> Option<u32> {
    let remaining: Vec<f64> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Processing)
        .map(Job::remaining_secs)
        .collect();
    if remaining.is_empty() {
        return None;
    }
    let mean = remaining.iter().sum::<f64>() / remaining.len() as f64;
    Some(mean.max(0.0).round() as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
