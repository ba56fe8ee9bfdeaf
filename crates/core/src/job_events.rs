//! Event type names for job lifecycle notifications.
//!
//! Published on the event bus by the engine and forwarded verbatim to
//! Server-Sent Event subscribers by the API.

/// A job was registered and enqueued.
pub const EVENT_JOB_QUEUED: &str = "job_queued";

/// Progress update during job execution (fraction + current step).
pub const EVENT_JOB_PROGRESS: &str = "job_progress";

/// Job completed successfully.
pub const EVENT_JOB_COMPLETED: &str = "job_completed";

/// Job failed with an error.
pub const EVENT_JOB_FAILED: &str = "job_failed";

/// Job was cancelled before a worker picked it up.
pub const EVENT_JOB_CANCELLED: &str = "job_cancelled";
