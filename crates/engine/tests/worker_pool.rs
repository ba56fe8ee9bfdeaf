mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{
    batch, build_engine, build_engine_with, image_post, test_config, wait_until_complete,
    ScriptedProvider,
};
use vizgen_core::error::CoreError;
use vizgen_core::job::JobStatus;
use vizgen_core::job_events::EVENT_JOB_PROGRESS;
use vizgen_engine::{EngineError, GenerationEngine};

async fn wait_for_processing(engine: &GenerationEngine, campaign_id: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while engine.campaign_status(campaign_id).await.processing_jobs == 0 {
        assert!(tokio::time::Instant::now() < deadline, "no job started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_jobs_complete() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(20)));
    let engine = build_engine(Arc::clone(&provider));
    engine.start_workers(3).await.unwrap();

    let jobs = engine
        .submit(batch("c1", vec![image_post("a"), image_post("b"), image_post("c")]))
        .await
        .unwrap();
    let status = wait_until_complete(&engine, "c1", Duration::from_secs(5)).await;
    engine.stop_workers().await;

    assert_eq!(status.completed_jobs, 3);
    assert_eq!(status.failed_jobs, 0);
    for job in &jobs {
        let done = engine.job_status(&job.job_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 1.0);
        assert!(done.started_at.is_some());
        assert!(done.completed_at >= done.started_at);
        assert!(done.result_url.is_some());

        let progress = engine.job_progress(&job.job_id).await.unwrap();
        assert_eq!(progress.current_step, "complete");
        assert_eq!(progress.progress, 1.0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_worker_count() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(30)));
    let engine = build_engine(Arc::clone(&provider));
    engine.start_workers(2).await.unwrap();

    let posts = (0..8).map(|i| image_post(&format!("p{i}"))).collect();
    engine.submit(batch("busy", posts)).await.unwrap();
    let status = wait_until_complete(&engine, "busy", Duration::from_secs(10)).await;
    engine.stop_workers().await;

    assert_eq!(status.completed_jobs, 8);
    assert!(provider.max_concurrency() <= 2);
    assert!(provider.max_concurrency() >= 1);
}

#[tokio::test]
async fn jobs_are_dispatched_in_submission_order() {
    let provider = Arc::new(ScriptedProvider::default());
    let engine = build_engine(Arc::clone(&provider));

    let jobs = engine
        .submit(batch("fifo", (0..5).map(|i| image_post(&format!("p{i}"))).collect()))
        .await
        .unwrap();
    engine.start_workers(1).await.unwrap();
    wait_until_complete(&engine, "fifo", Duration::from_secs(5)).await;
    engine.stop_workers().await;

    let expected: Vec<String> = jobs.into_iter().map(|j| j.job_id).collect();
    assert_eq!(provider.calls(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_finishes_in_flight_and_keeps_queued() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(150)));
    let engine = build_engine(Arc::clone(&provider));
    engine.start_workers(1).await.unwrap();

    engine
        .submit(batch("halt", vec![image_post("a"), image_post("b"), image_post("c")]))
        .await
        .unwrap();
    wait_for_processing(&engine, "halt").await;

    engine.stop_workers().await;
    assert!(!engine.is_running().await);

    let status = engine.campaign_status("halt").await;
    assert_eq!(status.completed_jobs, 1);
    assert_eq!(status.processing_jobs, 0);
    assert_eq!(status.queued_jobs, 2);

    // Nothing moves while stopped.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.campaign_status("halt").await.queued_jobs, 2);

    engine.start_workers(1).await.unwrap();
    let status = wait_until_complete(&engine, "halt", Duration::from_secs(5)).await;
    engine.stop_workers().await;
    assert_eq!(status.completed_jobs, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_during_drain_waits_for_old_pool() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(300)));
    let engine = Arc::new(build_engine(Arc::clone(&provider)));
    engine.start_workers(1).await.unwrap();

    engine
        .submit(batch("drain", vec![image_post("a"), image_post("b"), image_post("c")]))
        .await
        .unwrap();
    wait_for_processing(&engine, "drain").await;

    let stopping = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.stop_workers().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!engine.is_running().await);
    assert_eq!(engine.stats().await.worker_count, 0);

    // Returns only once the draining worker has finished its job.
    engine.start_workers(1).await.unwrap();
    assert_eq!(engine.campaign_status("drain").await.completed_jobs, 1);
    stopping.await.unwrap();
    assert!(engine.is_running().await);

    let status = wait_until_complete(&engine, "drain", Duration::from_secs(5)).await;
    engine.stop_workers().await;
    assert_eq!(status.completed_jobs, 3);
    assert_eq!(provider.max_concurrency(), 1);
}

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    engine.stop_workers().await;
    assert!(!engine.is_running().await);

    engine.start_workers(2).await.unwrap();
    engine.start_workers(5).await.unwrap();
    let stats = engine.stats().await;
    assert!(stats.running);
    assert_eq!(stats.worker_count, 2);

    engine.stop_workers().await;
    engine.stop_workers().await;
    assert!(!engine.stats().await.running);
}

#[tokio::test]
async fn zero_workers_is_rejected() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    assert_matches!(
        engine.start_workers(0).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert!(!engine.is_running().await);
}

#[tokio::test]
async fn progress_events_never_go_backwards() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(10)));
    let engine = build_engine(Arc::clone(&provider));
    let mut events = engine.events().subscribe();
    engine.start_workers(2).await.unwrap();

    let jobs = engine
        .submit(batch("mono", vec![image_post("a"), common::video_post("b")]))
        .await
        .unwrap();
    wait_until_complete(&engine, "mono", Duration::from_secs(5)).await;
    engine.stop_workers().await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    for job in &jobs {
        let progress: Vec<f64> = seen
            .iter()
            .filter(|e| e.event_type == EVENT_JOB_PROGRESS && e.job_id == job.job_id)
            .map(|e| e.payload["progress"].as_f64().unwrap())
            .collect();
        assert!(progress.len() >= 3, "too few progress events: {progress:?}");
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_status_reads_are_consistent() {
    let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_millis(5)));
    let engine = build_engine_with(
        vizgen_engine::EngineConfig {
            worker_count: 4,
            ..test_config()
        },
        Arc::clone(&provider),
    );
    engine.start_workers(4).await.unwrap();
    engine
        .submit(batch("race", (0..24).map(|i| image_post(&format!("p{i}"))).collect()))
        .await
        .unwrap();

    for _ in 0..20 {
        let reads = (0..8).map(|_| engine.campaign_status("race"));
        for status in futures::future::join_all(reads).await {
            let counted = status.queued_jobs
                + status.processing_jobs
                + status.completed_jobs
                + status.failed_jobs
                + status.cancelled_jobs;
            assert_eq!(counted, status.total_jobs);
            assert_eq!(status.total_jobs, 24);
            assert!((0.0..=1.0).contains(&status.overall_progress));
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    wait_until_complete(&engine, "race", Duration::from_secs(10)).await;
    engine.stop_workers().await;
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    assert!(engine.job_status("image_x_y_deadbeef").await.is_none());
    assert!(engine.job_progress("image_x_y_deadbeef").await.is_none());
    assert_matches!(
        engine.cancel_job("image_x_y_deadbeef").await,
        Err(EngineError::Core(CoreError::NotFound { .. }))
    );
}
