//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use kameo_macros::Reply;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::job::{JobStatus, ReconcileOutcome};

// ============================================================================
// FleetMonitorActor Messages
// ============================================================================

/// Check every active host once
#[derive(Debug, Clone, Default)]
pub struct RunMonitoringPass {
    /// Cancelling stops in-flight jobs before their next irreversible action
    pub cancel: CancellationToken,
}

/// Tally of one monitoring pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Reply)]
pub struct PassReport {
    /// Jobs run
    pub checked: usize,
    /// Hosts whose status was written
    pub transitioned: usize,
    /// Hosts left as they were
    pub unchanged: usize,
    /// Jobs that lost a conditional update race
    pub conflicts: usize,
    /// Jobs that published an error
    pub failed: usize,
    /// Jobs stopped by cancellation
    pub cancelled: usize,
}

impl PassReport {
    /// Account for one finished job
    pub fn record(&mut self, status: &JobStatus) {
        self.checked += 1;

        match (&status.error, &status.outcome) {
            (Some(CoreError::Cancelled), _) => self.cancelled += 1,
            (Some(_), _) => self.failed += 1,
            (None, Some(ReconcileOutcome::Transitioned { .. })) => self.transitioned += 1,
            (None, Some(ReconcileOutcome::Conflict { .. })) => self.conflicts += 1,
            (None, _) => self.unchanged += 1,
        }
    }

    /// Record a job that could not be run at all
    pub fn record_failure(&mut self) {
        self.checked += 1;
        self.failed += 1;
    }
}

/// Get monitoring statistics
#[derive(Debug)]
pub struct GetFleetStatus;

/// Monitoring statistics
#[derive(Debug, Clone, Reply)]
pub struct FleetStatus {
    /// Completed monitoring passes
    pub passes: u64,
    /// Jobs started since the actor came up
    pub jobs_started: u64,
    /// Report of the most recent pass
    pub last_report: Option<PassReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HostStatus;

    fn completed(error: Option<CoreError>, outcome: Option<ReconcileOutcome>) -> JobStatus {
        JobStatus {
            completed: true,
            error,
            outcome,
        }
    }

    #[test]
    fn test_report_tallies_outcomes() {
        let mut report = PassReport::default();
        report.record(&completed(
            None,
            Some(ReconcileOutcome::Transitioned {
                from: HostStatus::Running,
                to: HostStatus::Terminated,
            }),
        ));
        report.record(&completed(
            None,
            Some(ReconcileOutcome::Conflict {
                expected: HostStatus::Running,
                actual: Some(HostStatus::Terminated),
            }),
        ));
        report.record(&completed(None, Some(ReconcileOutcome::Unchanged)));
        report.record(&completed(Some(CoreError::Cancelled), None));
        report.record(&completed(
            Some(CoreError::TransientProvider("down".to_string())),
            None,
        ));
        report.record_failure();

        assert_eq!(
            report,
            PassReport {
                checked: 6,
                transitioned: 1,
                unchanged: 1,
                conflicts: 1,
                failed: 2,
                cancelled: 1,
            }
        );
    }
}
