//! Configuration types for host monitoring

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with a running host that stopped answering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPolicy {
    /// Move the host to `Quarantined` and leave the instance alone
    #[default]
    Quarantine,
    /// Terminate the instance and mark the host `Terminated`
    Terminate,
}

/// How a reconciliation job treats a host id missing from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHostPolicy {
    /// Publish `CoreError::HostNotFound`
    #[default]
    Fail,
    /// Complete successfully without doing anything
    Ignore,
}

/// Monitoring settings shared by every reconciliation job
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How long a running host may go without communication before escalation
    pub unreachable_threshold: Duration,
    /// Escalation applied to unreachable running hosts
    pub escalation: EscalationPolicy,
    /// Behavior for host ids absent from the store
    pub missing_host: MissingHostPolicy,
    /// Number of jobs a monitoring pass runs in parallel
    pub workers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            unreachable_threshold: Duration::from_secs(10 * 60),
            escalation: EscalationPolicy::default(),
            missing_host: MissingHostPolicy::default(),
            workers: 8,
        }
    }
}
