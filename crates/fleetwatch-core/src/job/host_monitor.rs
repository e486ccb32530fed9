//! Reconciliation job for one host
//!
//! Loads the host record, reads the provider's view of the instance, runs
//! the state machine and applies its decision with a single conditional
//! update. Either the whole decision lands or the record is left untouched.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use fleetwatch_cloud::ProviderRegistry;

use crate::config::{MissingHostPolicy, MonitorConfig};
use crate::error::CoreError;
use crate::events::HostEvent;
use crate::host::HostUpdate;
use crate::job::{JobBase, JobStatus, JobType, ReconcileOutcome};
use crate::state::decide;
use crate::store::{HostStore, UpdateOutcome};

/// Everything a reconciliation job needs from its surroundings
#[derive(Clone)]
pub struct MonitorEnv {
    /// Host record store
    pub store: Arc<dyn HostStore>,
    /// Providers by tag
    pub providers: ProviderRegistry,
    /// Monitoring settings
    pub config: MonitorConfig,
    /// Event sender, `None` to skip event emission
    pub events: Option<broadcast::Sender<HostEvent>>,
}

impl MonitorEnv {
    /// Environment without event emission
    pub fn new(
        store: Arc<dyn HostStore>,
        providers: ProviderRegistry,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            providers,
            config,
            events: None,
        }
    }

    /// Emit host events on `tx`
    #[must_use]
    pub fn with_events(mut self, tx: broadcast::Sender<HostEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: HostEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }
}

/// Checks one host against its provider and reconciles the record
pub struct HostMonitorExternalStateJob {
    base: JobBase,
    env: MonitorEnv,
}

impl HostMonitorExternalStateJob {
    /// Bind a job to `host_id`
    pub fn new(env: MonitorEnv, host_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            base: JobBase::new(job_id, JobType::HostMonitorExternalState, host_id),
            env,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.base.id()
    }

    #[must_use]
    pub fn host_id(&self) -> &str {
        self.base.host_id()
    }

    #[must_use]
    pub fn job_type(&self) -> JobType {
        self.base.job_type()
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.base.status()
    }

    #[must_use]
    pub fn error(&self) -> Option<CoreError> {
        self.base.error()
    }

    /// Wait for the current run to publish its result
    pub async fn wait_completed(&self) -> JobStatus {
        self.base.wait_completed().await
    }

    /// Run the check and publish the result
    ///
    /// Failures are published through `error()`, never returned.
    #[instrument(skip_all, fields(job = %self.base.id(), host = %self.base.host_id()))]
    pub async fn run(&self, cancel: &CancellationToken) {
        self.base.start();

        let result = self.reconcile(cancel).await;

        match &result {
            Ok(outcome) => debug!(outcome = ?outcome, "host check completed"),
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "host check failed");
                self.env.emit(HostEvent::CheckFailed {
                    host: self.host_id().to_string(),
                    error: e.to_string(),
                });
            }
        }

        self.base.complete(result);
    }

    async fn reconcile(&self, cancel: &CancellationToken) -> Result<ReconcileOutcome, CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let host_id = self.host_id();

        let Some(host) = self.env.store.find_one(host_id).await? else {
            return match self.env.config.missing_host {
                MissingHostPolicy::Fail => Err(CoreError::HostNotFound(host_id.to_string())),
                MissingHostPolicy::Ignore => {
                    debug!("host no longer in store, skipping");
                    Ok(ReconcileOutcome::HostMissing)
                }
            };
        };

        if host.status.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal);
        }

        let provider = self
            .env
            .providers
            .get(&host.provider)
            .ok_or_else(|| CoreError::UnknownProvider(host.provider.clone()))?;

        let snapshot = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = provider.get_instance_status(host.instance_ref()) => result,
        };

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => {
                warn!(
                    provider = %host.provider,
                    instance = %host.instance_ref(),
                    "instance not found at provider"
                );
                return Ok(ReconcileOutcome::InstanceMissing);
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        let decision = decide(
            host.status,
            &snapshot,
            host.time_since_last_communication(now),
            self.env.config.unreachable_threshold,
            self.env.config.escalation,
        );

        let Some(next) = decision.next else {
            return Ok(ReconcileOutcome::Unchanged);
        };
        host.status.transition_to(next)?;

        // Nothing irreversible has happened yet
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        if decision.terminates_instance() {
            provider.terminate(host.instance_ref()).await?;
            info!(provider = %host.provider, reason = ?decision.reason, "instance terminated");
            self.env.emit(HostEvent::InstanceTerminated {
                host: host.id.clone(),
                provider: host.provider.clone(),
            });
        }

        let outcome = self
            .env
            .store
            .update_if_status(&host.id, host.status, HostUpdate::transition(next, now))
            .await?;

        match outcome {
            UpdateOutcome::Applied => {
                info!(
                    from = %host.status,
                    to = %next,
                    reason = ?decision.reason,
                    "host status reconciled"
                );
                self.env.emit(HostEvent::StatusChanged {
                    host: host.id.clone(),
                    from: host.status,
                    to: next,
                });
                Ok(ReconcileOutcome::Transitioned {
                    from: host.status,
                    to: next,
                })
            }
            UpdateOutcome::Conflict { actual } => {
                info!(
                    expected = %host.status,
                    actual = %actual,
                    "host changed concurrently, skipping"
                );
                Ok(ReconcileOutcome::Conflict {
                    expected: host.status,
                    actual: Some(actual),
                })
            }
            UpdateOutcome::NotFound => {
                info!(expected = %host.status, "host removed concurrently, skipping");
                Ok(ReconcileOutcome::Conflict {
                    expected: host.status,
                    actual: None,
                })
            }
        }
    }
}
