//! Job execution wrapper shared by fleet jobs
//!
//! A job is an immutable `JobDescriptor` plus the latest `JobStatus`,
//! published through a `watch` channel. Each publish replaces the whole
//! status value, so a scheduler reading `status()` on another worker sees
//! either the old value or the new one, and `completed` arrives together
//! with the error that goes with it.

pub mod host_monitor;

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::CoreError;
use crate::state::HostStatus;

pub use host_monitor::{HostMonitorExternalStateJob, MonitorEnv};

/// Kind of fleet job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    HostMonitorExternalState,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::HostMonitorExternalState => {
                f.write_str("host-monitoring-external-state-check")
            }
        }
    }
}

/// Immutable identity of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub id: String,
    pub job_type: JobType,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
}

/// What a reconciliation run ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Host id absent from the store, ignored by policy
    HostMissing,
    /// Host already terminated; provider not contacted
    AlreadyTerminal,
    /// Provider no longer knows the instance
    InstanceMissing,
    /// Record already consistent with the provider
    Unchanged,
    /// Status written to the store
    Transitioned { from: HostStatus, to: HostStatus },
    /// Another writer moved the host first; nothing written
    Conflict {
        expected: HostStatus,
        /// Status found by the failed write, `None` if the host vanished
        actual: Option<HostStatus>,
    },
}

impl ReconcileOutcome {
    /// Whether the run changed the store
    #[must_use]
    pub fn is_transition(&self) -> bool {
        matches!(self, ReconcileOutcome::Transitioned { .. })
    }
}

/// Latest published state of a job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStatus {
    pub completed: bool,
    pub error: Option<CoreError>,
    pub outcome: Option<ReconcileOutcome>,
}

/// Descriptor plus atomically published status
#[derive(Debug)]
pub struct JobBase {
    descriptor: JobDescriptor,
    status_tx: watch::Sender<JobStatus>,
}

impl JobBase {
    /// Create a job that has not run yet
    pub fn new(id: impl Into<String>, job_type: JobType, host_id: impl Into<String>) -> Self {
        let (status_tx, _) = watch::channel(JobStatus::default());
        Self {
            descriptor: JobDescriptor {
                id: id.into(),
                job_type,
                host_id: host_id.into(),
                created_at: Utc::now(),
            },
            status_tx,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    #[must_use]
    pub fn job_type(&self) -> JobType {
        self.descriptor.job_type
    }

    #[must_use]
    pub fn host_id(&self) -> &str {
        &self.descriptor.host_id
    }

    /// Snapshot of the current status
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status_tx.borrow().clone()
    }

    /// Error of the last completed run
    #[must_use]
    pub fn error(&self) -> Option<CoreError> {
        self.status_tx.borrow().error.clone()
    }

    /// Watch status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status_tx.subscribe()
    }

    /// Wait until a completed status is published and return it
    pub async fn wait_completed(&self) -> JobStatus {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| s.completed).await {
            Ok(status) => (*status).clone(),
            Err(_) => self.status(),
        }
    }

    /// Mark a new run as in progress
    pub fn start(&self) {
        self.status_tx.send_replace(JobStatus::default());
    }

    /// Publish the result of a run
    pub fn complete(&self, result: Result<ReconcileOutcome, CoreError>) {
        let status = match result {
            Ok(outcome) => JobStatus {
                completed: true,
                error: None,
                outcome: Some(outcome),
            },
            Err(error) => JobStatus {
                completed: true,
                error: Some(error),
                outcome: None,
            },
        };
        self.status_tx.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_new_job_is_not_completed() {
        let job = JobBase::new("j1", JobType::HostMonitorExternalState, "h1");
        assert!(!job.status().completed);
        assert!(job.error().is_none());
        assert_eq!(job.host_id(), "h1");
        assert_eq!(
            job.job_type().to_string(),
            "host-monitoring-external-state-check"
        );
    }

    #[test]
    fn test_error_published_with_completion() {
        let job = JobBase::new("j1", JobType::HostMonitorExternalState, "h1");
        job.complete(Err(CoreError::Cancelled));

        let status = job.status();
        assert!(status.completed);
        assert_eq!(status.error, Some(CoreError::Cancelled));
        assert!(status.outcome.is_none());
    }

    #[tokio::test]
    async fn test_wait_completed_from_another_task() {
        let job = Arc::new(JobBase::new("j1", JobType::HostMonitorExternalState, "h1"));

        let waiter = {
            let job = job.clone();
            tokio::spawn(async move { job.wait_completed().await })
        };

        tokio::task::yield_now().await;
        job.complete(Ok(ReconcileOutcome::Unchanged));

        let status = waiter.await.unwrap();
        assert!(status.completed);
        assert_eq!(status.outcome, Some(ReconcileOutcome::Unchanged));
    }
}
