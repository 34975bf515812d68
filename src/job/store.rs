//! In-memory job store with a single-writer lease per job.
//!
//! Readers take cheap snapshots under a shared lock. The executor driving a job
//! holds a [`JobLease`], the only handle able to advance, complete or fail it;
//! cancellation is the one write that bypasses the lease and it can only ever
//! move a job to `Failed`, which the lease then observes.

use crate::error::ApiError;
use crate::job::{GenerationResult, JobId, JobStatus};
use crate::progress::{JobProgress, NoopSink, ProgressSink};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const QUEUED_STEP: &str = "Queued";
pub const CANCELLED_STEP: &str = "Cancelled";
pub const CANCELLED_ERROR: &str = "Job cancelled by user";

/// Point-in-time view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    /// 0-100.
    pub progress: u8,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A status/progress write requested by the lease holder.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub progress: u8,
    pub step: String,
    pub message: Option<String>,
}

impl JobUpdate {
    pub fn new(status: JobStatus, progress: u8, step: impl Into<String>) -> Self {
        Self {
            status,
            progress,
            step: step.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was live and is now `Failed`.
    Cancelled,
    /// The job had already failed; nothing changed.
    AlreadyFailed,
}

struct JobEntry {
    snapshot: JobSnapshot,
    result: Option<GenerationResult>,
    /// Sink of the live lease, if any.
    lease_sink: Option<Arc<dyn ProgressSink>>,
}

pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
    ttl: chrono::Duration,
}

impl JobStore {
    /// Create a store that forgets terminal jobs `ttl` after their last update.
    pub fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            jobs: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Insert a new `Pending` job.
    pub fn create(&self, job_id: JobId) -> Result<JobSnapshot, ApiError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job_id) {
            return Err(ApiError::DuplicateJob(job_id));
        }
        let now = Utc::now();
        let snapshot = JobSnapshot {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
            progress: 0,
            current_step: QUEUED_STEP.to_string(),
            message: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        jobs.insert(
            job_id.clone(),
            JobEntry {
                snapshot: snapshot.clone(),
                result: None,
                lease_sink: None,
            },
        );
        debug!(job_id = %job_id, "job_created");
        Ok(snapshot)
    }

    pub fn get(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        self.jobs
            .read()
            .get(job_id)
            .map(|entry| entry.snapshot.clone())
            .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))
    }

    /// Every job still held, oldest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self
            .jobs
            .read()
            .values()
            .map(|entry| entry.snapshot.clone())
            .collect();
        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        snapshots
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Result of a completed job.
    pub fn result(&self, job_id: &JobId) -> Result<GenerationResult, ApiError> {
        let jobs = self.jobs.read();
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
        match (entry.snapshot.status, &entry.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (JobStatus::Failed, _) => Err(ApiError::JobFailed {
                job_id: job_id.clone(),
                error: entry
                    .snapshot
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            (status, _) => Err(ApiError::ResultNotReady {
                job_id: job_id.clone(),
                status,
            }),
        }
    }

    /// Take the single writer lease for a job. Fails when another lease is live
    /// or the job is already terminal.
    pub fn claim(
        self: &Arc<Self>,
        job_id: &JobId,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobLease, ApiError> {
        let mut jobs = self.jobs.write();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
        if entry.snapshot.status.is_terminal() {
            return Err(ApiError::JobTerminal {
                job_id: job_id.clone(),
                status: entry.snapshot.status,
            });
        }
        if entry.lease_sink.is_some() {
            return Err(ApiError::JobAlreadyDriven(job_id.clone()));
        }
        entry.lease_sink = Some(Arc::clone(&sink));
        Ok(JobLease {
            store: Arc::clone(self),
            job_id: job_id.clone(),
            sink,
        })
    }

    /// Cancel a job. Live jobs become `Failed` with progress reset to zero;
    /// an executor still holding the lease sees the terminal status on its next write.
    pub fn cancel(&self, job_id: &JobId) -> Result<CancelOutcome, ApiError> {
        self.cancel_notifying(job_id, &NoopSink)
    }

    /// [`cancel`](Self::cancel), publishing the cancelled snapshot to the live
    /// lease's sink, or to `unleased` when no executor holds the job.
    pub fn cancel_notifying(
        &self,
        job_id: &JobId,
        unleased: &dyn ProgressSink,
    ) -> Result<CancelOutcome, ApiError> {
        let (snapshot, lease_sink) = {
            let mut jobs = self.jobs.write();
            let entry = jobs
                .get_mut(job_id)
                .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
            match entry.snapshot.status {
                JobStatus::Completed => return Err(ApiError::CannotCancelCompleted(job_id.clone())),
                JobStatus::Failed => return Ok(CancelOutcome::AlreadyFailed),
                _ => {}
            }
            let snapshot = &mut entry.snapshot;
            snapshot.status = JobStatus::Failed;
            snapshot.progress = 0;
            snapshot.current_step = CANCELLED_STEP.to_string();
            snapshot.message = None;
            snapshot.error = Some(CANCELLED_ERROR.to_string());
            snapshot.updated_at = Utc::now();
            (snapshot.clone(), entry.lease_sink.clone())
        };
        info!(job_id = %job_id, leased = lease_sink.is_some(), "job_cancelled");

        let event = JobProgress::from_snapshot(&snapshot);
        match lease_sink {
            Some(sink) => sink.publish(event),
            None => unleased.publish(event),
        }
        Ok(CancelOutcome::Cancelled)
    }

    /// Drop terminal jobs whose last update is older than the TTL.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now())
    }

    pub fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            !entry.snapshot.status.is_terminal()
                || entry
                    .snapshot
                    .updated_at
                    .checked_add_signed(ttl)
                    .map_or(true, |expires| expires > now)
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!(evicted, remaining = jobs.len(), "jobs_evicted");
        }
        evicted
    }

    /// Fail a job whose executor vanished without releasing it cleanly
    /// (panic or abort). Refused while a lease is still live.
    pub(crate) fn fail_abandoned(
        &self,
        job_id: &JobId,
        error: &str,
    ) -> Result<JobSnapshot, ApiError> {
        let mut jobs = self.jobs.write();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
        if entry.lease_sink.is_some() {
            return Err(ApiError::JobAlreadyDriven(job_id.clone()));
        }
        Self::fail_entry(job_id, entry, error)
    }

    fn fail_entry(
        job_id: &JobId,
        entry: &mut JobEntry,
        error: &str,
    ) -> Result<JobSnapshot, ApiError> {
        let status = entry.snapshot.status;
        if status.is_terminal() {
            return Err(ApiError::JobTerminal {
                job_id: job_id.clone(),
                status,
            });
        }
        let snapshot = &mut entry.snapshot;
        snapshot.status = JobStatus::Failed;
        snapshot.current_step = "Failed".to_string();
        snapshot.message = None;
        snapshot.error = Some(error.to_string());
        snapshot.updated_at = Utc::now();
        Ok(snapshot.clone())
    }

    fn write(
        &self,
        job_id: &JobId,
        update: JobUpdate,
        result: Option<GenerationResult>,
    ) -> Result<JobSnapshot, ApiError> {
        let mut jobs = self.jobs.write();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
        let current = entry.snapshot.status;
        if current.is_terminal() {
            return Err(ApiError::JobTerminal {
                job_id: job_id.clone(),
                status: current,
            });
        }
        let completing = update.status == JobStatus::Completed;
        let legal = if update.status == current {
            true
        } else {
            current.can_transition_to(update.status)
        };
        if !legal || update.status == JobStatus::Failed || completing != result.is_some() {
            return Err(ApiError::InvalidTransition {
                from: current,
                to: update.status,
            });
        }
        let progress = update.progress.min(100);
        if progress < entry.snapshot.progress {
            return Err(ApiError::ProgressRegression {
                job_id: job_id.clone(),
                current: entry.snapshot.progress,
                requested: progress,
            });
        }

        let snapshot = &mut entry.snapshot;
        snapshot.status = update.status;
        snapshot.progress = progress;
        snapshot.current_step = update.step;
        snapshot.message = update.message;
        snapshot.updated_at = Utc::now();
        if result.is_some() {
            entry.result = result;
        }
        Ok(entry.snapshot.clone())
    }

    fn release(&self, job_id: &JobId) {
        if let Some(entry) = self.jobs.write().get_mut(job_id) {
            entry.lease_sink = None;
        }
    }
}

/// Exclusive write handle for one job. Every successful write is published to
/// the lease's progress sink after the store lock is released. Dropping the
/// lease releases the claim.
pub struct JobLease {
    store: Arc<JobStore>,
    job_id: JobId,
    sink: Arc<dyn ProgressSink>,
}

impl JobLease {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// True once the job was cancelled from outside.
    pub fn is_cancelled(&self) -> bool {
        self.store
            .get(&self.job_id)
            .map(|snapshot| snapshot.status == JobStatus::Failed)
            .unwrap_or(true)
    }

    pub fn advance(&self, update: JobUpdate) -> Result<JobSnapshot, ApiError> {
        let snapshot = self.store.write(&self.job_id, update, None)?;
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Mark the job `Completed` at 100% and attach its result.
    pub fn complete(
        &self,
        result: GenerationResult,
        message: impl Into<String>,
    ) -> Result<JobSnapshot, ApiError> {
        let update = JobUpdate::new(JobStatus::Completed, 100, "Complete!").with_message(message);
        let snapshot = self.store.write(&self.job_id, update, Some(result))?;
        info!(job_id = %self.job_id, "job_completed");
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Mark the job `Failed`, keeping its last progress value.
    pub fn fail(&self, error: &str) -> Result<JobSnapshot, ApiError> {
        let snapshot = {
            let mut jobs = self.store.jobs.write();
            let entry = jobs
                .get_mut(&self.job_id)
                .ok_or_else(|| ApiError::JobNotFound(self.job_id.clone()))?;
            JobStore::fail_entry(&self.job_id, entry, error)?
        };
        info!(job_id = %self.job_id, error, "job_failed");
        self.publish(&snapshot);
        Ok(snapshot)
    }

    fn publish(&self, snapshot: &JobSnapshot) {
        self.sink.publish(JobProgress::from_snapshot(snapshot));
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        self.store.release(&self.job_id);
    }
}
