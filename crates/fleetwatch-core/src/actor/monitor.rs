//! `FleetMonitorActor`: Fleet-wide monitoring passes
//!
//! Dispatches one reconciliation job per active host on a bounded worker
//! pool and keeps statistics about past passes.

use std::sync::Arc;

use chrono::Utc;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::CoreError;
use crate::job::{HostMonitorExternalStateJob, JobStatus, JobType, MonitorEnv};
use crate::message::{FleetStatus, GetFleetStatus, PassReport, RunMonitoringPass};

/// Arguments for spawning a `FleetMonitorActor`
pub struct FleetMonitorActorArgs {
    /// Store, providers, settings and event sender shared by every job
    pub env: MonitorEnv,
}

/// Fleet monitor running reconciliation jobs
pub struct FleetMonitorActor {
    env: MonitorEnv,
    passes: u64,
    jobs_started: u64,
    last_report: Option<PassReport>,
}

impl FleetMonitorActor {
    fn job_id(&self, host_id: &str) -> String {
        format!(
            "{}.{}.{}.{}",
            JobType::HostMonitorExternalState,
            host_id,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.passes
        )
    }
}

impl Actor for FleetMonitorActor {
    type Args = FleetMonitorActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        if args.env.config.workers == 0 {
            return Err(CoreError::ConfigError(
                "monitor workers must be at least 1".to_string(),
            ));
        }

        info!(
            id = %actor_ref.id(),
            workers = args.env.config.workers,
            providers = ?args.env.providers.names(),
            "FleetMonitorActor starting"
        );

        Ok(Self {
            env: args.env,
            passes: 0,
            jobs_started: 0,
            last_report: None,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, passes = self.passes, "FleetMonitorActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RunMonitoringPass> for FleetMonitorActor {
    type Reply = Result<PassReport, CoreError>;

    async fn handle(
        &mut self,
        msg: RunMonitoringPass,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let hosts = self.env.store.find_active().await?;
        let workers = Arc::new(Semaphore::new(self.env.config.workers));
        let mut tasks = JoinSet::new();

        for host in hosts {
            let job = HostMonitorExternalStateJob::new(
                self.env.clone(),
                host.id.clone(),
                self.job_id(&host.id),
            );
            let workers = workers.clone();
            let cancel = msg.cancel.clone();
            self.jobs_started += 1;

            tasks.spawn(async move {
                match workers.acquire_owned().await {
                    Ok(_permit) => {
                        job.run(&cancel).await;
                        job.status()
                    }
                    Err(e) => JobStatus {
                        completed: true,
                        error: Some(CoreError::ActorError(e.to_string())),
                        outcome: None,
                    },
                }
            });
        }

        let mut report = PassReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(status) => report.record(&status),
                Err(e) => {
                    error!(error = %e, "reconciliation task panicked");
                    report.record_failure();
                }
            }
        }

        self.passes += 1;
        self.last_report = Some(report.clone());

        info!(
            pass = self.passes,
            checked = report.checked,
            transitioned = report.transitioned,
            conflicts = report.conflicts,
            failed = report.failed,
            cancelled = report.cancelled,
            "monitoring pass completed"
        );

        Ok(report)
    }
}

impl Message<GetFleetStatus> for FleetMonitorActor {
    type Reply = FleetStatus;

    async fn handle(
        &mut self,
        _msg: GetFleetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        FleetStatus {
            passes: self.passes,
            jobs_started: self.jobs_started,
            last_report: self.last_report.clone(),
        }
    }
}
