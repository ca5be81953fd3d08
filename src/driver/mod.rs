//! Polling driver: runs reconciliation passes on a fixed interval.
//!
//! One pass is probe -> fetch -> compare -> (maybe) write. Passes never
//! overlap: the loop awaits each pass before it waits for the next tick, and a
//! stop request is only observed between passes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::model::Registration;
use crate::probe::CommandExecutor;
use crate::registry::{RegistrationAdapter, Registry};
use crate::tags::{self, TagPrefix, Update};

pub mod error;


pub use error::PassError;

/// Shortest interval the driver accepts.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Observable driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for the next tick.
    Idle,
    /// A pass is in flight.
    Reconciling,
    /// The loop has observed the stop signal and returned.
    ShuttingDown,
}

/// What a pass did to the registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Managed tags already matched; nothing was written.
    Unchanged,
    /// The registration was rewritten with these tags.
    Updated(Vec<String>),
}

/// Static settings of one driver instance.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub service_id: String,
    pub command: String,
    pub prefix: TagPrefix,
    pub interval: Duration,
}

pub struct Driver {
    cfg: DriverConfig,
    adapter: RegistrationAdapter,
    executor: Arc<dyn CommandExecutor>,
    state: watch::Sender<DriverState>,
}

impl Driver {
    pub fn new(
        mut cfg: DriverConfig,
        registry: Arc<dyn Registry>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        if cfg.interval < MIN_INTERVAL {
            warn!(
                component = "driver",
                event = "interval_clamped",
                service = %cfg.service_id,
                interval = ?cfg.interval,
                "interval is shorter than 1ms, using 1ms"
            );
            cfg.interval = MIN_INTERVAL;
        }
        let (state, _) = watch::channel(DriverState::Idle);
        Self {
            cfg,
            adapter: RegistrationAdapter::new(registry),
            executor,
            state,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.cfg
    }

    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    /// Runs passes every interval until `shutdown` is cancelled.
    ///
    /// The first pass happens one interval after start. Failed passes are
    /// logged and the loop continues.
    pub async fn run(&self, shutdown: CancellationToken) {
        let period = self.cfg.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.state.send_replace(DriverState::Idle);
        info!(
            component = "driver",
            event = "started",
            service = %self.cfg.service_id,
            command = %self.cfg.command,
            interval = ?period,
            tag_prefix = %self.cfg.prefix,
            "tag reconciliation loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.state.send_replace(DriverState::Reconciling);
            if let Err(err) = self.reconcile().await {
                error!(
                    component = "driver",
                    event = "pass_failed",
                    service = %self.cfg.service_id,
                    kind = err.kind(),
                    error = %err,
                    "error updating service tags"
                );
            }
            self.state.send_replace(DriverState::Idle);
        }

        self.state.send_replace(DriverState::ShuttingDown);
        info!(
            component = "driver",
            event = "stopped",
            service = %self.cfg.service_id,
            "tag reconciliation loop stopped"
        );
    }

    /// Runs one full pass: probe, fetch, compare and write when needed.
    pub async fn reconcile(&self) -> Result<PassOutcome, PassError> {
        info!(
            component = "driver",
            event = "probe_started",
            service = %self.cfg.service_id,
            command = %self.cfg.command,
            "running command"
        );
        let raw = self.executor.execute(&self.cfg.command).await?;
        let candidate = tags::parse_probe_output(&raw, &self.cfg.prefix);

        let registration = self.adapter.fetch(&self.cfg.service_id).await?;
        self.write_if_needed(&registration, &candidate).await
    }

    /// Removes every managed tag from the registration, once.
    ///
    /// Writes only when at least one managed tag is present.
    pub async fn cleanup(&self) -> Result<PassOutcome, PassError> {
        let registration = self.adapter.fetch(&self.cfg.service_id).await?;
        self.write_if_needed(&registration, &BTreeSet::new()).await
    }

    async fn write_if_needed(
        &self,
        registration: &Registration,
        candidate: &BTreeSet<String>,
    ) -> Result<PassOutcome, PassError> {
        match tags::needs_update(&registration.tags, candidate, &self.cfg.prefix) {
            Update::Unchanged => {
                debug!(
                    component = "driver",
                    event = "tags_unchanged",
                    service = %self.cfg.service_id,
                    "managed tags already up to date"
                );
                Ok(PassOutcome::Unchanged)
            }
            Update::Write(new_tags) => {
                self.adapter.apply(registration, new_tags.clone()).await?;
                info!(
                    component = "driver",
                    event = "tags_updated",
                    service = %self.cfg.service_id,
                    tags = ?new_tags,
                    "updated service tags"
                );
                Ok(PassOutcome::Updated(new_tags))
            }
        }
    }
}
