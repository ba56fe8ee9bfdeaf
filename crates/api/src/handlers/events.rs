//! Server-Sent Events stream of job lifecycle events.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use vizgen_events::JobEvent;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventStreamQuery {
    /// Only forward events for this campaign.
    pub campaign_id: Option<String>,
}

impl EventStreamQuery {
    pub fn matches(&self, event: &JobEvent) -> bool {
        self.campaign_id
            .as_deref()
            .map_or(true, |campaign_id| campaign_id == event.campaign_id)
    }
}

/// GET /api/v1/events
///
/// Each SSE message is named after the event type and carries the
/// [`JobEvent`] as JSON. A subscriber that falls behind skips the events
/// it missed. The stream ends when the server shuts down.
pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.event_bus.subscribe();
    tracing::debug!(campaign_id = ?query.campaign_id, "Event stream opened");

    let events = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .filter(move |event| futures::future::ready(query.matches(event)))
    .map(|event| Ok(to_sse(&event)))
    .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_sse(event: &JobEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!(error = %e, job_id = %event.job_id, "Failed to serialize job event");
        "{}".to_string()
    });
    Event::default().event(event.event_type.as_str()).data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_filter() {
        let event = JobEvent::new("job_queued", "spring", "image_spring_p1_00000000");

        assert!(EventStreamQuery::default().matches(&event));
        assert!(EventStreamQuery {
            campaign_id: Some("spring".into())
        }
        .matches(&event));
        assert!(!EventStreamQuery {
            campaign_id: Some("autumn".into())
        }
        .matches(&event));
    }
}
