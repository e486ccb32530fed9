//! Actor implementations

pub mod monitor;

pub use monitor::{FleetMonitorActor, FleetMonitorActorArgs};
