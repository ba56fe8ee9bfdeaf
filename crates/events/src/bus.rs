//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`JobEvent`]s. It is
//! shared via `Arc<EventBus>` between the engine and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use vizgen_core::job::Job;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// Something that happened to a generation job.
///
/// Constructed via [`JobEvent::new`] or [`JobEvent::for_job`] and enriched
/// with [`with_payload`](JobEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// Event name, one of the `vizgen_core::job_events` constants.
    pub event_type: String,

    pub campaign_id: String,

    pub job_id: String,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(
        event_type: impl Into<String>,
        campaign_id: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            campaign_id: campaign_id.into(),
            job_id: job_id.into(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Event about `job`, with its status and progress in the payload.
    pub fn for_job(event_type: impl Into<String>, job: &Job) -> Self {
        Self::new(event_type, job.campaign_id.clone(), job.job_id.clone()).with_payload(
            serde_json::json!({
                "post_id": job.post_id,
                "content_type": job.content_type,
                "status": job.status,
                "progress": job.progress,
            }),
        )
    }

    /// Merge `payload` into the event's payload object.
    ///
    /// Non-object payloads replace the current one.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        match payload {
            serde_json::Value::Object(extra) if self.payload.is_object() => {
                if let Some(current) = self.payload.as_object_mut() {
                    current.extend(extra);
                }
            }
            other => self.payload = other,
        }
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use vizgen_events::bus::{EventBus, JobEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(JobEvent::new("job_queued", "spring", "image_spring_p1_1a2b3c4d"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: JobEvent) {
        tracing::trace!(
            event_type = %event.event_type,
            job_id = %event.job_id,
            "Publishing job event",
        );
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
