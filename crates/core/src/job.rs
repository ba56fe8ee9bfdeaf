//! Generation job model and its forward-only state machine.
//!
//! ```text
//! Queued ──> Processing ──> Completed
//!   │             └───────> Failed
//!   └──> Cancelled
//! ```
//!
//! Every transition is a method on [`Job`] returning `Result`; an illegal
//! transition yields [`CoreError::Conflict`] and leaves the job untouched.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::content::ContentType;
use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Progress recorded when a worker picks a job up.
pub const PROGRESS_STARTED: f64 = 0.1;

/// Progress of a finished job.
pub const PROGRESS_DONE: f64 = 1.0;

/// Step label of a freshly submitted job.
pub const STEP_QUEUED: &str = "queued";

/// Step label recorded on dequeue.
pub const STEP_STARTING: &str = "starting";

/// Step label of a cancelled job.
pub const STEP_CANCELLED: &str = "cancelled";

/// Step label of a failed job.
pub const STEP_FAILED: &str = "failed";

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether the job can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One unit of generation work: a single visual asset for a single post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub campaign_id: String,
    pub post_id: String,
    pub content_type: ContentType,
    pub prompt: String,
    pub status: JobStatus,
    /// Fraction complete in `0.0..=1.0`.
    pub progress: f64,
    pub estimated_completion_seconds: u32,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub result_url: Option<String>,
    /// Business context, objective and post snapshot for the provider.
    pub metadata: serde_json::Value,
}

/// Fields needed to create a queued [`Job`].
#[derive(Debug, Clone)]
pub struct NewJob {
    pub campaign_id: String,
    pub post_id: String,
    pub content_type: ContentType,
    pub prompt: String,
    pub estimated_completion_seconds: u32,
    pub metadata: serde_json::Value,
}

/// Build a globally unique job id: `{content_type}_{campaign}_{post}_{suffix}`.
///
/// The suffix is the first 8 hex digits of a random UUID.
pub fn generate_job_id(content_type: ContentType, campaign_id: &str, post_id: &str) -> JobId {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{content_type}_{campaign_id}_{post_id}_{}", &suffix[..8])
}

impl Job {
    /// Create a job in [`JobStatus::Queued`] with zero progress.
    pub fn queued(new: NewJob) -> Self {
        Self {
            job_id: generate_job_id(new.content_type, &new.campaign_id, &new.post_id),
            campaign_id: new.campaign_id,
            post_id: new.post_id,
            content_type: new.content_type,
            prompt: new.prompt,
            status: JobStatus::Queued,
            progress: 0.0,
            estimated_completion_seconds: new.estimated_completion_seconds,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            result_url: None,
            metadata: new.metadata,
        }
    }

    /// `Queued -> Processing`: stamp `started_at` and set initial progress.
    pub fn start(&mut self, now: Timestamp) -> Result<(), CoreError> {
        self.expect_status(JobStatus::Queued, "start")?;
        self.status = JobStatus::Processing;
        self.started_at = Some(now);
        self.raise_progress(PROGRESS_STARTED);
        Ok(())
    }

    /// `Processing -> Processing`: record a milestone.
    ///
    /// Progress never goes backwards; a lower value keeps the current one.
    pub fn advance(&mut self, progress: f64) -> Result<(), CoreError> {
        self.expect_status(JobStatus::Processing, "advance")?;
        self.raise_progress(progress);
        Ok(())
    }

    /// `Processing -> Completed` with the provider's result URL.
    pub fn complete(&mut self, result_url: String, now: Timestamp) -> Result<(), CoreError> {
        self.expect_status(JobStatus::Processing, "complete")?;
        if result_url.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Job {} cannot complete without a result URL",
                self.job_id
            )));
        }
        self.status = JobStatus::Completed;
        self.progress = PROGRESS_DONE;
        self.result_url = Some(result_url);
        self.completed_at = Some(now);
        Ok(())
    }

    /// `Processing -> Failed`. Progress keeps its last value for diagnostics.
    pub fn fail(&mut self, message: impl Into<String>, now: Timestamp) -> Result<(), CoreError> {
        self.expect_status(JobStatus::Processing, "fail")?;
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(now);
        Ok(())
    }

    /// `Queued -> Cancelled`. Jobs already handed to a worker cannot be
    /// cancelled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), CoreError> {
        self.expect_status(JobStatus::Queued, "cancel")?;
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Seconds of work left according to the estimate, for ETA reporting.
    pub fn remaining_secs(&self) -> f64 {
        self.estimated_completion_seconds as f64 * (1.0 - self.progress)
    }

    fn raise_progress(&mut self, progress: f64) {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
    }

    fn expect_status(&self, expected: JobStatus, action: &str) -> Result<(), CoreError> {
        if self.status != expected {
            return Err(CoreError::Conflict(format!(
                "Cannot {action} job {} in status {} (expected {expected})",
                self.job_id, self.status
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProgressRecord
// ---------------------------------------------------------------------------

/// Human-readable progress of one job, updated alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub job_id: JobId,
    pub current_step: String,
    pub progress: f64,
    pub last_update: Timestamp,
}

impl ProgressRecord {
    /// Initial record for a queued job.
    pub fn queued(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            current_step: STEP_QUEUED.to_string(),
            progress: 0.0,
            last_update: Utc::now(),
        }
    }

    /// Mirror the job's progress under a new step label.
    pub fn record(&mut self, job: &Job, step: impl Into<String>, now: Timestamp) {
        self.current_step = step.into();
        self.progress = job.progress;
        self.last_update = now;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
