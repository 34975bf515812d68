//! Property-based tests for the job state machine

use proptest::prelude::*;
use reelsmith::job::{JobStore, JobUpdate, Stage};
use reelsmith::progress::NoopSink;
use reelsmith::{JobId, JobStatus};
use std::sync::Arc;
use std::time::Duration;

const STAGES: [Stage; 4] = [
    Stage::LanguageDetection,
    Stage::SpeechSynthesis,
    Stage::VideoGeneration,
    Stage::MediaMerge,
];

fn order(status: JobStatus) -> usize {
    match status {
        JobStatus::Pending => 0,
        JobStatus::DetectingLanguage => 1,
        JobStatus::GeneratingSpeech => 2,
        JobStatus::GeneratingVideo => 3,
        JobStatus::Merging => 4,
        JobStatus::Completed | JobStatus::Failed => 5,
    }
}

/// Whatever updates an executor attempts, accepted ones never move a job backwards.
#[test]
fn test_accepted_updates_only_move_forward() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec((0usize..4, 0u8..=120), 1..20),
            |updates| {
                let store = Arc::new(JobStore::new(Duration::from_secs(60)));
                let job_id = JobId::from("job-prop");
                store.create(job_id.clone()).unwrap();
                let lease = store.claim(&job_id, Arc::new(NoopSink)).unwrap();

                let mut last = store.get(&job_id).unwrap();
                for (stage, progress) in updates {
                    let stage = STAGES[stage];
                    let accepted = lease
                        .advance(JobUpdate::new(stage.status(), progress, stage.step()))
                        .is_ok();
                    let now = store.get(&job_id).unwrap();
                    if accepted {
                        prop_assert!(now.progress >= last.progress);
                        prop_assert!(now.progress <= 100);
                        prop_assert!(order(now.status) >= order(last.status));
                        prop_assert_eq!(now.status, stage.status());
                    } else {
                        prop_assert_eq!(now.status, last.status);
                        prop_assert_eq!(now.progress, last.progress);
                    }
                    last = now;
                }
                Ok(())
            },
        )
        .unwrap();
}

/// A cancelled job rejects every later write from its executor.
#[test]
fn test_cancelled_jobs_stay_failed() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..4, 0usize..4), |(before, after)| {
            let store = Arc::new(JobStore::new(Duration::from_secs(60)));
            let job_id = JobId::from("job-cancel");
            store.create(job_id.clone()).unwrap();
            let lease = store.claim(&job_id, Arc::new(NoopSink)).unwrap();

            let stage = STAGES[before];
            let _ = lease.advance(JobUpdate::new(stage.status(), stage.checkpoint(), stage.step()));
            store.cancel(&job_id).unwrap();

            let stage = STAGES[after];
            prop_assert!(lease
                .advance(JobUpdate::new(stage.status(), 99, stage.step()))
                .is_err());
            prop_assert!(lease.fail("late failure").is_err());
            let snapshot = store.get(&job_id).unwrap();
            prop_assert_eq!(snapshot.status, JobStatus::Failed);
            prop_assert_eq!(snapshot.progress, 0);
            Ok(())
        })
        .unwrap();
}
