mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{batch, build_engine, image_post, video_post, wait_until_complete, ScriptedProvider};
use vizgen_core::content::ContentType;
use vizgen_core::error::CoreError;
use vizgen_core::job::JobStatus;
use vizgen_core::post::Post;
use vizgen_engine::{EngineError, SubmitBatch};

#[tokio::test]
async fn image_and_video_posts_expand_in_order() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    let jobs = engine
        .submit(batch("launch", vec![image_post("p1"), video_post("p2")]))
        .await
        .unwrap();

    let shape: Vec<(&str, ContentType)> = jobs
        .iter()
        .map(|j| (j.post_id.as_str(), j.content_type))
        .collect();
    assert_eq!(
        shape,
        [
            ("p1", ContentType::Image),
            ("p2", ContentType::Image),
            ("p2", ContentType::Video),
        ]
    );

    for job in &jobs {
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0.0);
        assert_eq!(job.campaign_id, "launch");
        assert!(job.job_id.starts_with(&format!("{}_launch_{}_", job.content_type, job.post_id)));
        assert!(job.prompt.contains("Harbor Bakery"));
    }
    assert_eq!(jobs[0].estimated_completion_seconds, 45);
    assert_eq!(jobs[2].estimated_completion_seconds, 120);
    assert_eq!(jobs[1].prompt, jobs[2].prompt);
}

#[tokio::test]
async fn job_ids_are_unique() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));
    let posts = (0..20).map(|i| video_post(&format!("p{i}"))).collect();

    let jobs = engine.submit(batch("c", posts)).await.unwrap();

    let mut ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 40);
}

#[tokio::test]
async fn text_only_batch_creates_no_jobs() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    let jobs = engine
        .submit(batch("quiet", vec![Post::new("a", "text"), Post::new("b", "poll")]))
        .await
        .unwrap();

    assert!(jobs.is_empty());
    let status = engine.campaign_status("quiet").await;
    assert_eq!(status.total_jobs, 0);
    assert!(status.is_complete);
    assert_eq!(status.overall_progress, 0.0);
}

#[tokio::test]
async fn malformed_post_rejects_whole_batch() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));
    let broken = Post::new("", "text_image");

    let result = engine
        .submit(batch("bad", vec![image_post("p1"), broken]))
        .await;

    assert_matches!(
        result,
        Err(EngineError::Core(CoreError::Validation(msg))) if msg.contains("index 1")
    );
    assert_eq!(engine.campaign_status("bad").await.total_jobs, 0);
    assert_eq!(engine.stats().await.queue_depth, 0);
}

#[tokio::test]
async fn invalid_campaign_id_is_rejected() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    let result = engine.submit(batch("a/b", vec![image_post("p1")])).await;

    assert_matches!(result, Err(EngineError::Core(CoreError::Validation(_))));
}

#[tokio::test]
async fn submit_without_workers_leaves_jobs_queued() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));

    let jobs = engine
        .submit(batch("idle", vec![image_post("p1"), image_post("p2")]))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = engine.campaign_status("idle").await;
    assert_eq!(status.queued_jobs, 2);
    assert!(!status.is_complete);
    assert_eq!(status.estimated_completion_seconds, None);

    let progress = engine.job_progress(&jobs[0].job_id).await.unwrap();
    assert_eq!(progress.current_step, "queued");
    assert_eq!(engine.stats().await.queue_depth, 2);
}

#[tokio::test]
async fn completed_campaign_reports_visuals_per_post() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));
    engine.start_workers(2).await.unwrap();

    engine
        .submit(batch("spring", vec![image_post("p1"), video_post("p2"), Post::new("p3", "text")]))
        .await
        .unwrap();
    let status = wait_until_complete(&engine, "spring", Duration::from_secs(5)).await;
    engine.stop_workers().await;

    assert_eq!(status.total_jobs, 3);
    assert_eq!(status.completed_jobs, 3);
    assert_eq!(status.overall_progress, 1.0);

    let p1 = &status.posts_with_visuals["p1"];
    assert!(p1.image_url.as_deref().unwrap().ends_with(".image"));
    assert_eq!(p1.video_url, None);

    let p2 = &status.posts_with_visuals["p2"];
    assert!(p2.image_url.is_some());
    assert!(p2.video_url.as_deref().unwrap().ends_with(".video"));
    assert!(!status.posts_with_visuals.contains_key("p3"));
}

#[tokio::test]
async fn numeric_post_ids_are_accepted() {
    let engine = build_engine(Arc::new(ScriptedProvider::default()));
    let input: SubmitBatch = serde_json::from_value(serde_json::json!({
        "campaign_id": "c1",
        "posts": [
            { "id": 42, "type": "text_image" },
            { "id": "p7", "type": "text_video" },
        ],
    }))
    .unwrap();

    let jobs = engine.submit(input).await.unwrap();

    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].post_id, "42");
    assert!(jobs[0].job_id.starts_with("image_c1_42_"));
    assert_eq!(jobs[0].metadata["post"]["id"], "42");
}
