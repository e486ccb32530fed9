//! Instance snapshot types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Instance status as reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Terminated,
    Stopped,
    Unknown,
}

impl InstanceStatus {
    /// Every instance status, in declaration order
    pub const ALL: [InstanceStatus; 4] = [
        InstanceStatus::Running,
        InstanceStatus::Terminated,
        InstanceStatus::Stopped,
        InstanceStatus::Unknown,
    ];
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Terminated => "terminated",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Point-in-time read of an instance's external state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Provider considers the machine powered on
    pub is_up: bool,
    /// SSH port answered
    pub is_ssh_reachable: bool,
    /// Provider-reported instance status
    pub status: InstanceStatus,
}

impl InstanceSnapshot {
    /// Snapshot of a healthy running instance
    #[must_use]
    pub fn running() -> Self {
        Self {
            is_up: true,
            is_ssh_reachable: true,
            status: InstanceStatus::Running,
        }
    }

    /// Whether the host can currently be reached
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.is_up && self.is_ssh_reachable
    }
}
