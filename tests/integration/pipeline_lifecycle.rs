//! End-to-end job lifecycle through the generation service.

use crate::integration::test_utils::*;
use reelsmith::job::CancelOutcome;
use reelsmith::progress::ProgressSink;
use reelsmith::provider::ProviderClients;
use reelsmith::{ApiError, GenerationRequest, JobId, JobProgress, JobStatus};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::test]
async fn submitted_job_runs_to_completion() {
    let service = healthy_service();
    let mut rx = service.subscribe();

    let handle = service.generate(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = handle.job_id().clone();
    let result = handle.wait().await.unwrap();

    assert_eq!(result.job_id, job_id);
    assert_eq!(result.providers.video, "alpha_video");
    assert_eq!(result.providers.voice, "alpha_voice");
    assert_eq!(result.providers.language.as_deref(), Some("alpha_lang"));
    assert_eq!(result.detected_language.as_deref(), Some("en"));
    assert!(!result.used_fallback);
    assert!(!result.audio_merged);
    assert_eq!(result.thumbnail_ref.as_deref(), Some("alpha_video.mp4.jpg"));

    let snapshot = service.query_job(&job_id).unwrap();
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.current_step, "Complete!");
    assert_eq!(service.query_result(&job_id).unwrap(), result);

    let events = drain(&mut rx);
    assert!(!events.is_empty());
    for pair in events.windows(2) {
        assert!(pair[0].progress <= pair[1].progress);
    }
    let last = events.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.progress, 100);
}

#[tokio::test]
async fn billed_cost_sums_every_stage() {
    let service = healthy_service();
    let request = GenerationRequest::new(PROMPT).with_duration(10);
    let chars = request.text_chars() as f64;

    let plan = service.create_plan(request).await.unwrap();
    assert_eq!(plan.estimated_video_cost(), 0.5 * 10.0);
    let result = service.submit(plan).unwrap().wait().await.unwrap();

    let expected = 0.5 * 10.0 + 0.2 * (chars / 1000.0);
    assert!((result.total_cost - expected).abs() < 1e-9);
}

#[tokio::test]
async fn skipped_detection_never_enters_detecting_language() {
    let service = healthy_service();
    let mut rx = service.subscribe();

    let handle = service
        .generate(GenerationRequest::new(PROMPT).without_language_detection())
        .await
        .unwrap();
    let result = handle.wait().await.unwrap();

    assert!(result.detected_language.is_none());
    assert!(result.providers.language.is_none());
    let events = drain(&mut rx);
    assert!(events.iter().all(|e| e.status != JobStatus::DetectingLanguage));
    assert_eq!(events[0].status, JobStatus::GeneratingSpeech);
}

#[tokio::test]
async fn execute_plan_reports_to_the_callers_sink() {
    let service = healthy_service();
    let plan = service.create_plan(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = plan.job_id().clone();

    let (tx, mut rx) = mpsc::channel::<JobProgress>(32);
    let sink: Arc<dyn ProgressSink> = Arc::new(tx);
    service.execute_plan(plan, sink).await.unwrap();

    let mut steps = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.job_id, job_id);
        steps.push(event.current_step);
    }
    assert_eq!(
        steps,
        vec![
            "Detecting language...",
            "Generating speech...",
            "Generating video...",
            "Complete!",
        ]
    );
}

#[tokio::test]
async fn cancelling_a_running_job_discards_its_output() {
    let gate = Arc::new(Gate::default());
    let clients = healthy_clients().with_video(
        "alpha_video",
        Arc::new(ScriptedVideo::new("alpha_video", true).gated(Arc::clone(&gate))),
    );
    let merger = Arc::new(RecordingMerger::default());
    let service = service_with(small_registry(), clients, Arc::clone(&merger));

    let handle = service.generate(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = handle.job_id().clone();
    gate.entered.notified().await;

    let running = service.query_job(&job_id).unwrap();
    assert_eq!(running.status, JobStatus::GeneratingVideo);
    assert!(matches!(
        service.query_result(&job_id),
        Err(ApiError::ResultNotReady { .. })
    ));

    assert_eq!(service.cancel(&job_id).unwrap(), CancelOutcome::Cancelled);
    gate.release.notify_one();

    assert!(matches!(handle.wait().await, Err(ApiError::Cancelled(_))));
    assert!(merger.calls.lock().is_empty());
    let snapshot = service.query_job(&job_id).unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.error.as_deref(), Some("Job cancelled by user"));
    assert!(matches!(
        service.query_result(&job_id),
        Err(ApiError::JobFailed { .. })
    ));
    assert_eq!(service.cancel(&job_id).unwrap(), CancelOutcome::AlreadyFailed);
}

#[tokio::test]
async fn cancelling_execute_plan_reaches_the_callers_sink() {
    let gate = Arc::new(Gate::default());
    let clients = healthy_clients().with_video(
        "alpha_video",
        Arc::new(ScriptedVideo::new("alpha_video", true).gated(Arc::clone(&gate))),
    );
    let service = service_with(small_registry(), clients, Arc::default());
    let mut bus_rx = service.subscribe();
    let plan = service.create_plan(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = plan.job_id().clone();

    let (tx, mut rx) = mpsc::channel::<JobProgress>(32);
    let sink: Arc<dyn ProgressSink> = Arc::new(tx);
    let (outcome, cancelled) = tokio::join!(service.execute_plan(plan, sink), async {
        gate.entered.notified().await;
        let cancelled = service.cancel(&job_id);
        gate.release.notify_one();
        cancelled
    });

    assert_eq!(cancelled.unwrap(), CancelOutcome::Cancelled);
    assert!(matches!(outcome, Err(ApiError::Cancelled(_))));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let last = events.last().unwrap();
    assert_eq!(last.status, JobStatus::Failed);
    assert_eq!(last.progress, 0);
    assert_eq!(last.error.as_deref(), Some("Job cancelled by user"));

    let failed_on_bus = drain(&mut bus_rx)
        .into_iter()
        .filter(|e| e.status == JobStatus::Failed)
        .count();
    assert_eq!(failed_on_bus, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parked_job_does_not_hold_up_other_jobs() {
    const OTHERS: usize = 8;
    let gate = Arc::new(Gate::default());
    let clients = healthy_clients().with_video(
        "alpha_video",
        Arc::new(ScriptedVideo::new("alpha_video", true).gated_on(Arc::clone(&gate), "parked")),
    );
    let service = service_with(small_registry(), clients, Arc::default());

    let parked = service
        .generate(GenerationRequest::new("A parked barge on a misty canal"))
        .await
        .unwrap();
    let parked_id = parked.job_id().clone();
    gate.entered.notified().await;

    let mut handles = Vec::new();
    for n in 0..OTHERS {
        let request = GenerationRequest::new(format!("{} at hour {}", PROMPT, n));
        handles.push(service.generate(request).await.unwrap());
    }
    let results = futures::future::join_all(handles.into_iter().map(|h| h.wait())).await;
    for result in results {
        assert_eq!(result.unwrap().providers.video, "alpha_video");
    }

    assert_eq!(
        service.query_job(&parked_id).unwrap().status,
        JobStatus::GeneratingVideo
    );
    assert_eq!(
        service.usage_stats()["alpha_video"].total_requests,
        OTHERS as u64
    );

    gate.release.notify_one();
    let result = parked.wait().await.unwrap();
    assert_eq!(result.job_id, parked_id);

    let stats = service.usage_stats();
    assert_eq!(stats["alpha_video"].total_requests, OTHERS as u64 + 1);
    assert_eq!(stats["alpha_video"].successful_requests, OTHERS as u64 + 1);
    assert_eq!(service.list_jobs().len(), OTHERS + 1);
}

#[tokio::test]
async fn completed_jobs_cannot_be_cancelled() {
    let service = healthy_service();
    let handle = service.generate(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = handle.job_id().clone();
    handle.wait().await.unwrap();

    assert!(matches!(
        service.cancel(&job_id),
        Err(ApiError::CannotCancelCompleted(_))
    ));
    assert_eq!(service.query_job(&job_id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn panicking_executor_leaves_the_job_failed() {
    let clients = healthy_clients().with_video(
        "alpha_video",
        Arc::new(ScriptedVideo::new("alpha_video", true).panicking()),
    );
    let service = service_with(small_registry(), clients, Arc::default());

    let handle = service.generate(GenerationRequest::new(PROMPT)).await.unwrap();
    let job_id = handle.job_id().clone();
    match handle.wait().await {
        Err(ApiError::ExecutorAborted { reason, .. }) => assert!(reason.contains("crashed")),
        other => panic!("expected an aborted executor, got {:?}", other.map(|r| r.job_id)),
    }

    let snapshot = service.query_job(&job_id).unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert!(snapshot.error.unwrap().starts_with("Executor aborted"));
}

#[tokio::test]
async fn unknown_jobs_are_not_found() {
    let service = healthy_service();
    let ghost = JobId::from("job-0-0-0");
    assert!(matches!(service.query_job(&ghost), Err(ApiError::JobNotFound(_))));
    assert!(matches!(service.query_result(&ghost), Err(ApiError::JobNotFound(_))));
    assert!(matches!(service.cancel(&ghost), Err(ApiError::JobNotFound(_))));
}

#[tokio::test]
async fn plans_fail_before_any_job_exists() {
    let service = service_with(
        small_registry(),
        ProviderClients::new(),
        Arc::default(),
    );
    service.set_availability("alpha_voice", false).unwrap();
    service.set_availability("beta_voice", false).unwrap();

    let err = service
        .generate(GenerationRequest::new(PROMPT))
        .await
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "No voice providers available");
    assert!(service.list_jobs().is_empty());
}
