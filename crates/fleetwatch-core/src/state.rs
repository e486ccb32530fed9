//! Host life-cycle state machine
//!
//! `HostStatus::can_transition_to` is the single transition table; `decide`
//! maps a host's internal status and an external snapshot to the next status
//! and the side effects needed to get there.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fleetwatch_cloud::{InstanceSnapshot, InstanceStatus};

use crate::config::EscalationPolicy;
use crate::error::CoreError;

/// Persisted host status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Uninitialized,
    Starting,
    Provisioning,
    Running,
    Decommissioned,
    Quarantined,
    Terminated,
}

impl HostStatus {
    /// Every status, in declaration order
    pub const ALL: [HostStatus; 7] = [
        HostStatus::Uninitialized,
        HostStatus::Starting,
        HostStatus::Provisioning,
        HostStatus::Running,
        HostStatus::Decommissioned,
        HostStatus::Quarantined,
        HostStatus::Terminated,
    ];

    /// Terminal statuses absorb every later decision
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == HostStatus::Terminated
    }

    /// Whether `next` is a legal edge from `self`
    ///
    /// ```text
    /// Uninitialized  -> Starting | Provisioning
    /// Starting       -> Provisioning | Running
    /// Provisioning   -> Running
    /// Running        -> Decommissioned | Quarantined
    /// Quarantined    -> Running | Decommissioned
    /// any non-terminal -> Terminated
    /// ```
    #[must_use]
    pub fn can_transition_to(self, next: HostStatus) -> bool {
        use HostStatus::{
            Decommissioned, Provisioning, Quarantined, Running, Starting, Terminated,
            Uninitialized,
        };

        if self.is_terminal() {
            return false;
        }
        if next == Terminated {
            return true;
        }

        matches!(
            (self, next),
            (Uninitialized, Starting | Provisioning)
                | (Starting, Provisioning | Running)
                | (Provisioning, Running)
                | (Running, Decommissioned | Quarantined)
                | (Quarantined, Running | Decommissioned)
        )
    }

    /// Validate an edge, returning the target on success
    ///
    /// # Errors
    /// `CoreError::InvalidTransition` if the edge is not in the table.
    pub fn transition_to(self, next: HostStatus) -> Result<HostStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            HostStatus::Uninitialized => "uninitialized",
            HostStatus::Starting => "starting",
            HostStatus::Provisioning => "provisioning",
            HostStatus::Running => "running",
            HostStatus::Decommissioned => "decommissioned",
            HostStatus::Quarantined => "quarantined",
            HostStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work the caller must perform before persisting a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Ask the provider to terminate the instance
    TerminateInstance,
}

/// Why a decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Host is already terminal
    AlreadyTerminal,
    /// Provider reports the instance terminated
    ExternallyTerminated,
    /// Running host unreachable for longer than the threshold
    Unreachable,
    /// Internal state agrees with the snapshot
    Consistent,
}

/// Outcome of the state machine for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Status to persist, `None` for no change
    pub next: Option<HostStatus>,
    /// Side effects to run before persisting
    pub effects: Vec<SideEffect>,
    pub reason: DecisionReason,
}

impl Decision {
    fn no_op(reason: DecisionReason) -> Self {
        Self {
            next: None,
            effects: Vec::new(),
            reason,
        }
    }

    /// Whether this decision changes anything
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.next.is_none() && self.effects.is_empty()
    }

    /// Whether the decision requires terminating the instance
    #[must_use]
    pub fn terminates_instance(&self) -> bool {
        self.effects.contains(&SideEffect::TerminateInstance)
    }
}

/// Decide how to reconcile `current` with `snapshot`
///
/// Pure and total: every input yields a decision, with no-op as the default.
/// Any `next` it returns is a legal edge from `current`.
#[must_use]
pub fn decide(
    current: HostStatus,
    snapshot: &InstanceSnapshot,
    since_last_communication: Duration,
    unreachable_threshold: Duration,
    escalation: EscalationPolicy,
) -> Decision {
    if current.is_terminal() {
        return Decision::no_op(DecisionReason::AlreadyTerminal);
    }

    if snapshot.status == InstanceStatus::Terminated {
        return Decision {
            next: Some(HostStatus::Terminated),
            effects: Vec::new(),
            reason: DecisionReason::ExternallyTerminated,
        };
    }

    if current == HostStatus::Running
        && !snapshot.is_reachable()
        && since_last_communication > unreachable_threshold
    {
        return match escalation {
            EscalationPolicy::Terminate => Decision {
                next: Some(HostStatus::Terminated),
                effects: vec![SideEffect::TerminateInstance],
                reason: DecisionReason::Unreachable,
            },
            EscalationPolicy::Quarantine => Decision {
                next: Some(HostStatus::Quarantined),
                effects: Vec::new(),
                reason: DecisionReason::Unreachable,
            },
        };
    }

    Decision::no_op(DecisionReason::Consistent)
}
