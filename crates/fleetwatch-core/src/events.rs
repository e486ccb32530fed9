//! Host monitoring events

use serde::{Deserialize, Serialize};

use crate::state::HostStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    StatusChanged {
        host: String,
        from: HostStatus,
        to: HostStatus,
    },
    InstanceTerminated {
        host: String,
        provider: String,
    },
    CheckFailed {
        host: String,
        error: String,
    },
}

impl HostEvent {
    /// Host the event refers to
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            HostEvent::StatusChanged { host, .. }
            | HostEvent::InstanceTerminated { host, .. }
            | HostEvent::CheckFailed { host, .. } => host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged() {
        let event = HostEvent::StatusChanged {
            host: "h1".to_string(),
            from: HostStatus::Running,
            to: HostStatus::Terminated,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StatusChanged");
        assert_eq!(json["to"], "terminated");
        assert_eq!(event.host(), "h1");
    }
}
