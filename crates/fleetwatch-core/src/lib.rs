//! fleetwatch-core: Host monitoring and reconciliation
//!
//! Host records and their store, the host life-cycle state machine, the
//! reconciliation job with its execution wrapper, and the `FleetMonitorActor`
//! that runs jobs across the fleet using the kameo framework.

pub mod actor;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod job;
pub mod message;
pub mod state;
pub mod store;

pub use actor::{FleetMonitorActor, FleetMonitorActorArgs};
pub use config::{EscalationPolicy, MissingHostPolicy, MonitorConfig};
pub use error::CoreError;
pub use events::HostEvent;
pub use host::{Host, HostUpdate};
pub use job::{
    HostMonitorExternalStateJob, JobBase, JobDescriptor, JobStatus, JobType, MonitorEnv,
    ReconcileOutcome,
};
pub use message::{FleetStatus, GetFleetStatus, PassReport, RunMonitoringPass};
pub use state::{Decision, DecisionReason, HostStatus, SideEffect, decide};
pub use store::{HostStore, MemoryHostStore, StoreError, UpdateOutcome};
