//! In-memory job and progress registry.
//!
//! All three indexes (jobs, progress records, campaign job lists) live
//! behind one [`RwLock`] so a reader always sees a consistent cut: a
//! campaign snapshot can never observe a job half-way through a
//! transition, and counts derived from it always add up.
//!
//! Jobs are never removed. There is no persistence across restarts.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use vizgen_core::error::CoreError;
use vizgen_core::job::{Job, JobStatus, ProgressRecord};
use vizgen_core::types::JobId;

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<JobId, Job>,
    progress: HashMap<JobId, ProgressRecord>,
    /// Job ids per campaign, in submission order.
    campaigns: HashMap<String, Vec<JobId>>,
}

/// Concurrency-safe store of every job the process has seen.
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<RegistryInner>,
}

/// Job counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.queued + self.processing + self.completed + self.failed + self.cancelled
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register freshly created jobs and append them to their campaigns.
    ///
    /// Returns a `Conflict` (and registers nothing) if any id is taken.
    pub async fn insert_batch(&self, jobs: &[Job]) -> Result<(), CoreError> {
        let mut inner = self.inner.write().await;

        if let Some(dup) = jobs.iter().find(|j| inner.jobs.contains_key(&j.job_id)) {
            return Err(CoreError::Conflict(format!(
                "Job id {} is already registered",
                dup.job_id
            )));
        }

        for job in jobs {
            inner
                .progress
                .insert(job.job_id.clone(), ProgressRecord::queued(&job.job_id));
            inner
                .campaigns
                .entry(job.campaign_id.clone())
                .or_default()
                .push(job.job_id.clone());
            inner.jobs.insert(job.job_id.clone(), job.clone());
        }
        Ok(())
    }

    /// Snapshot of a single job.
    pub async fn get(&self, job_id: &str) -> Option<Job> {
        self.inner.read().await.jobs.get(job_id).cloned()
    }

    /// Snapshot of a job's progress record.
    pub async fn progress(&self, job_id: &str) -> Option<ProgressRecord> {
        self.inner.read().await.progress.get(job_id).cloned()
    }

    /// Snapshot of every job in a campaign, in submission order.
    ///
    /// Unknown campaigns yield an empty list.
    pub async fn campaign_jobs(&self, campaign_id: &str) -> Vec<Job> {
        let inner = self.inner.read().await;
        inner
            .campaigns
            .get(campaign_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect()
    }

    /// Apply `transition` to a job and record `step` in its progress record.
    ///
    /// The job and its progress record change together under the write
    /// lock. If `transition` fails the job is left as it was and the error
    /// is returned. Returns the updated snapshot on success.
    pub async fn update<F>(&self, job_id: &str, step: &str, transition: F) -> Result<Job, CoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), CoreError>,
    {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let job = inner.jobs.get_mut(job_id).ok_or_else(|| CoreError::NotFound {
            entity: "Job",
            id: job_id.to_string(),
        })?;
        transition(job)?;

        let snapshot = job.clone();
        inner
            .progress
            .entry(job_id.to_string())
            .or_insert_with(|| ProgressRecord::queued(job_id))
            .record(&snapshot, step, Utc::now());
        Ok(snapshot)
    }

    /// Count jobs per status across all campaigns.
    pub async fn status_counts(&self) -> StatusCounts {
        let inner = self.inner.read().await;
        let mut counts = StatusCounts::default();
        for job in inner.jobs.values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }
}
