//! Worker loop and per-job processing.
//!
//! Each worker pulls one id at a time off the shared queue, so a pool of
//! `n` workers has at most `n` provider calls in flight. A job is mutated
//! only by the worker that dequeued it.

use std::any::Any;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use vizgen_core::error::CoreError;
use vizgen_core::job::{Job, STEP_FAILED, STEP_STARTING};
use vizgen_core::job_events::{EVENT_JOB_COMPLETED, EVENT_JOB_FAILED, EVENT_JOB_PROGRESS};
use vizgen_core::milestones::{milestones_for, Milestone};
use vizgen_events::JobEvent;
use vizgen_provider::{GenerationError, GenerationOutcome, GenerationRequest};

use crate::engine::EngineShared;
use crate::error::EngineError;

/// Run one worker until `cancel` fires.
///
/// The queue wait is bounded by the configured poll interval so the loop
/// keeps observing the stop signal. A job that is mid-flight when the
/// signal arrives is finished before the worker exits.
pub(crate) async fn run_worker(worker_id: usize, shared: Arc<EngineShared>, cancel: CancellationToken) {
    tracing::info!(worker_id, "Generation worker started");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = shared.queue.pop(shared.config.poll_interval) => next,
        };

        match next {
            Some(job_id) => process_job(worker_id, &shared, &job_id).await,
            None => tracing::trace!(worker_id, "Queue idle"),
        }
    }

    tracing::info!(worker_id, "Generation worker stopped");
}

/// Drive one dequeued job to a terminal state.
///
/// Never returns an error: anything that goes wrong after the job has been
/// claimed is recorded on the job as `Failed`.
async fn process_job(worker_id: usize, shared: &EngineShared, job_id: &str) {
    let job = match shared
        .registry
        .update(job_id, STEP_STARTING, |job| job.start(Utc::now()))
        .await
    {
        Ok(job) => job,
        Err(CoreError::NotFound { .. }) => {
            tracing::warn!(worker_id, job_id, "Dequeued job is not in the registry, skipping");
            return;
        }
        Err(e) => {
            tracing::info!(worker_id, job_id, reason = %e, "Skipping job that is no longer queued");
            return;
        }
    };

    tracing::info!(
        worker_id,
        job_id,
        campaign_id = %job.campaign_id,
        content_type = %job.content_type,
        "Processing generation job",
    );
    publish_progress(shared, &job, STEP_STARTING);

    shared.in_flight.fetch_add(1, Ordering::SeqCst);
    let result = execute(shared, &job).await;
    shared.in_flight.fetch_sub(1, Ordering::SeqCst);

    match result {
        Ok(finished) => {
            tracing::info!(
                worker_id,
                job_id,
                result_url = finished.result_url.as_deref().unwrap_or_default(),
                "Generation job completed",
            );
            shared
                .events
                .publish(JobEvent::for_job(EVENT_JOB_COMPLETED, &finished).with_payload(
                    serde_json::json!({ "result_url": finished.result_url }),
                ));
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(worker_id, job_id, error = %message, "Generation job failed");
            match shared
                .registry
                .update(job_id, STEP_FAILED, |job| job.fail(message.clone(), Utc::now()))
                .await
            {
                Ok(failed) => shared.events.publish(
                    JobEvent::for_job(EVENT_JOB_FAILED, &failed)
                        .with_payload(serde_json::json!({ "error": message })),
                ),
                Err(e) => {
                    tracing::error!(worker_id, job_id, error = %e, "Failed to record job failure")
                }
            }
        }
    }
}

/// Walk the milestones around the provider call and complete the job.
async fn execute(shared: &EngineShared, job: &Job) -> Result<Job, EngineError> {
    let milestones = milestones_for(job.content_type);

    advance(shared, &job.job_id, milestones.initializing).await?;
    advance(shared, &job.job_id, milestones.calling_provider).await?;

    let request = GenerationRequest {
        job_id: job.job_id.clone(),
        campaign_id: job.campaign_id.clone(),
        content_type: job.content_type,
        prompt: job.prompt.clone(),
        metadata: job.metadata.clone(),
    };
    let outcome = call_provider(shared, request).await?;
    if outcome.result_url.trim().is_empty() {
        return Err(GenerationError::EmptyResult.into());
    }
    tracing::debug!(
        job_id = %job.job_id,
        provider = shared.provider.name(),
        provider_ref = outcome.provider_ref.as_deref().unwrap_or_default(),
        "Provider returned result",
    );

    advance(shared, &job.job_id, milestones.saving_result).await?;

    let result_url = outcome.result_url;
    let finished = shared
        .registry
        .update(&job.job_id, milestones.complete.step, |job| {
            job.complete(result_url, Utc::now())
        })
        .await?;
    Ok(finished)
}

async fn advance(shared: &EngineShared, job_id: &str, milestone: Milestone) -> Result<(), EngineError> {
    let job = shared
        .registry
        .update(job_id, milestone.step, |job| job.advance(milestone.progress))
        .await?;
    publish_progress(shared, &job, milestone.step);
    Ok(())
}

/// Call the provider in its own task, bounded by the content-type budget.
///
/// A panic inside the provider surfaces as [`GenerationError::Panicked`]
/// instead of taking the worker down. On timeout the task is aborted.
async fn call_provider(
    shared: &EngineShared,
    request: GenerationRequest,
) -> Result<GenerationOutcome, GenerationError> {
    let budget = shared.config.timeout_for(request.content_type);
    let provider = Arc::clone(&shared.provider);
    let handle = tokio::spawn(async move { provider.generate(&request).await });
    let abort = handle.abort_handle();

    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) if join_error.is_panic() => Err(GenerationError::Panicked(
            panic_message(join_error.into_panic()),
        )),
        Ok(Err(join_error)) => Err(GenerationError::Request(join_error.to_string())),
        Err(_) => {
            abort.abort();
            Err(GenerationError::Timeout(budget))
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn publish_progress(shared: &EngineShared, job: &Job, step: &str) {
    shared.events.publish(
        JobEvent::for_job(EVENT_JOB_PROGRESS, job)
            .with_payload(serde_json::json!({ "current_step": step })),
    );
}
