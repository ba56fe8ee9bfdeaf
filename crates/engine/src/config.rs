use std::str::FromStr;
use std::time::Duration;

use vizgen_core::content::{ContentType, EstimatePolicy};
use vizgen_core::error::CoreError;

/// Default number of concurrent generation workers.
pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Default bounded wait on the queue before a worker re-checks for shutdown.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time budget for a single image provider call.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default time budget for a single video provider call.
pub const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_secs(900);

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pool size used by the host when starting workers.
    pub worker_count: usize,
    /// How long a worker waits on an empty queue before looping.
    pub poll_interval: Duration,
    /// Average durations reported as job estimates.
    pub estimates: EstimatePolicy,
    pub image_timeout: Duration,
    pub video_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            estimates: EstimatePolicy::default(),
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            video_timeout: DEFAULT_VIDEO_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `WORKER_COUNT`           | `3`     |
    /// | `QUEUE_POLL_INTERVAL_MS` | `1000`  |
    /// | `IMAGE_ESTIMATE_SECS`    | `45`    |
    /// | `VIDEO_ESTIMATE_SECS`    | `120`   |
    /// | `IMAGE_TIMEOUT_SECS`     | `300`   |
    /// | `VIDEO_TIMEOUT_SECS`     | `900`   |
    ///
    /// `WORKER_COUNT` and both timeouts must be at least 1.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let worker_count: usize = parse_var(&lookup, "WORKER_COUNT", defaults.worker_count)?;
        if worker_count == 0 {
            return Err(CoreError::Validation(
                "WORKER_COUNT must be at least 1".to_string(),
            ));
        }

        let poll_ms: u64 = parse_var(
            &lookup,
            "QUEUE_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;
        let estimates = EstimatePolicy {
            image_secs: parse_var(&lookup, "IMAGE_ESTIMATE_SECS", defaults.estimates.image_secs)?,
            video_secs: parse_var(&lookup, "VIDEO_ESTIMATE_SECS", defaults.estimates.video_secs)?,
        };
        let image_timeout: u64 = parse_var(
            &lookup,
            "IMAGE_TIMEOUT_SECS",
            defaults.image_timeout.as_secs(),
        )?;
        let video_timeout: u64 = parse_var(
            &lookup,
            "VIDEO_TIMEOUT_SECS",
            defaults.video_timeout.as_secs(),
        )?;
        for (key, secs) in [
            ("IMAGE_TIMEOUT_SECS", image_timeout),
            ("VIDEO_TIMEOUT_SECS", video_timeout),
        ] {
            if secs == 0 {
                return Err(CoreError::Validation(format!("{key} must be at least 1")));
            }
        }

        Ok(Self {
            worker_count,
            poll_interval: Duration::from_millis(poll_ms.max(1)),
            estimates,
            image_timeout: Duration::from_secs(image_timeout),
            video_timeout: Duration::from_secs(video_timeout),
        })
    }

    /// Provider call budget for `content_type`.
    pub fn timeout_for(&self, content_type: ContentType) -> Duration {
        match content_type {
            ContentType::Image => self.image_timeout,
            ContentType::Video => self.video_timeout,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{key} must be a non-negative integer, got \"{raw}\""))
        }),
    }
}
