//! Persisted host record

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::HostStatus;

/// Canonical record of one provisioned host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Unique host identifier
    pub id: String,
    /// Current life-cycle status
    pub status: HostStatus,
    /// Tag of the provider owning the instance
    pub provider: String,
    /// Last time the host was confirmed reachable
    pub last_communication_time: DateTime<Utc>,
    /// Identity that requested the host
    pub started_by: String,
    /// Provider-specific instance reference
    #[serde(default)]
    pub instance_id: Option<String>,
    /// When the record was created
    pub creation_time: DateTime<Utc>,
    /// When reconciliation marked the host terminated
    #[serde(default)]
    pub termination_time: Option<DateTime<Utc>>,
}

impl Host {
    /// Create a host record in `status`, last seen now
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        started_by: impl Into<String>,
        status: HostStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status,
            provider: provider.into(),
            last_communication_time: now,
            started_by: started_by.into(),
            instance_id: None,
            creation_time: now,
            termination_time: None,
        }
    }

    /// Set the last communication time
    #[must_use]
    pub fn with_last_communication(mut self, at: DateTime<Utc>) -> Self {
        self.last_communication_time = at;
        self
    }

    /// Set the provider instance reference
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Id the provider knows the instance by, `instance_id` when set
    #[must_use]
    pub fn instance_ref(&self) -> &str {
        self.instance_id.as_deref().unwrap_or(&self.id)
    }

    /// Time elapsed since the host last communicated, zero if in the future
    #[must_use]
    pub fn time_since_last_communication(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_communication_time)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Fields written by a conditional update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUpdate {
    /// New status
    pub status: HostStatus,
    /// Termination timestamp, set when moving to `Terminated`
    pub termination_time: Option<DateTime<Utc>>,
}

impl HostUpdate {
    /// Update moving a host to `status` at `now`
    #[must_use]
    pub fn transition(status: HostStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            termination_time: status.is_terminal().then_some(now),
        }
    }

    /// Apply the update to a record
    pub fn apply(&self, host: &mut Host) {
        host.status = self.status;
        if let Some(at) = self.termination_time {
            host.termination_time = Some(at);
        }
    }
}
