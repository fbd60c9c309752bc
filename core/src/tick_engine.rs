//! The fixed-cadence driver: computes the active zone set, runs each
//! active zone's pipeline with per-zone failure isolation, and
//! broadcasts the result, compensating its sleep for the work just
//! done rather than bursting ticks to catch up on an overrun.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use game_model::{BaseState, ZoneId};
use persistence_api::Gateway;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::adapter::GameLogicAdapter;
use crate::broadcast::fanout;
use crate::error::FrameworkError;
use crate::intent_queue::IntentQueue;
use crate::registry::SubscriptionRegistry;
use crate::snapshot::build_snapshot;

/// The tick engine's run state. `step` is orthogonal to this and
/// tracked separately since it's a one-shot request, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Paused,
    Stopping,
}

/// The fixed-cadence driver over every zone's tick pipeline.
///
/// Holds no zone state itself — it only orchestrates the gateway,
/// adapter, registry and intent queue, each of which is independently
/// lockable and already internally synchronized.
pub struct TickEngine {
    gateway: Arc<dyn Gateway>,
    adapter: GameLogicAdapter,
    registry: Arc<SubscriptionRegistry>,
    intents: Arc<IntentQueue>,
    tick_interval: Duration,
    state: Mutex<EngineState>,
    step_requested: Mutex<bool>,
    tick_number: AtomicU64,
}

impl TickEngine {
    /// Builds an engine in the `Running` state, starting at tick 0.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        adapter: GameLogicAdapter,
        registry: Arc<SubscriptionRegistry>,
        intents: Arc<IntentQueue>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            gateway,
            adapter,
            registry,
            intents,
            tick_interval,
            state: Mutex::new(EngineState::Running),
            step_requested: Mutex::new(false),
            tick_number: AtomicU64::new(0),
        }
    }

    /// The process-wide monotonic tick counter, shared by every zone
    /// processed in the same tick.
    pub fn tick_number(&self) -> u64 {
        self.tick_number.load(Ordering::SeqCst)
    }

    /// Current run state.
    pub async fn state(&self) -> EngineState {
        *self.state.lock().await
    }

    /// Transitions to `Paused`. Idempotent.
    pub async fn pause(&self) {
        let mut state = self.state.lock().await;
        if *state == EngineState::Running {
            *state = EngineState::Paused;
        }
    }

    /// Transitions back to `Running`. Idempotent. Intents accumulated
    /// during the pause are drained in full on the next tick — there is
    /// no smoothing across several ticks.
    pub async fn resume(&self) {
        let mut state = self.state.lock().await;
        if *state == EngineState::Paused {
            *state = EngineState::Running;
        }
    }

    /// Requests exactly one pipeline execution while paused. A no-op
    /// outside `Paused`.
    pub async fn step(&self) {
        *self.step_requested.lock().await = true;
    }

    /// Transitions to `Stopping`. The run loop exits at the next tick
    /// boundary — an in-flight tick always completes or rolls back its
    /// zones first, never aborted mid-pipeline.
    pub async fn shutdown(&self) {
        *self.state.lock().await = EngineState::Stopping;
    }

    /// Runs the cadence loop until `shutdown` is called. Intended to be
    /// driven by its own top-level task.
    pub async fn run(self: Arc<Self>) {
        loop {
            let start = Instant::now();
            let current_state = self.state().await;
            if current_state == EngineState::Stopping {
                info!("tick engine stopping");
                return;
            }

            let mut should_process = true;
            if current_state == EngineState::Paused {
                let mut step = self.step_requested.lock().await;
                if *step {
                    *step = false;
                } else {
                    should_process = false;
                }
            }

            if should_process {
                self.run_tick().await;
            }

            let elapsed = start.elapsed();
            if elapsed < self.tick_interval {
                tokio::time::sleep(self.tick_interval - elapsed).await;
            } else {
                warn!(
                    tick_number = self.tick_number(),
                    overrun_ms = elapsed.as_millis() as u64,
                    cadence_ms = self.tick_interval.as_millis() as u64,
                    "tick overran its cadence; proceeding to next boundary without a catch-up burst"
                );
            }
        }
    }

    async fn active_zone_set(&self) -> Vec<ZoneId> {
        let mut set: HashSet<ZoneId> = self.registry.subscribed_zone_ids().await.into_iter().collect();
        set.extend(self.intents.zones_with_queued_intents().await);
        set.into_iter().collect()
    }

    async fn run_tick(&self) {
        let tick_number = self.tick_number();
        let active = self.active_zone_set().await;
        let pipelines = active
            .into_iter()
            .map(|zone_id| self.run_zone_pipeline(zone_id, tick_number));
        futures_util::future::join_all(pipelines).await;
        self.tick_number.fetch_add(1, Ordering::SeqCst);
    }

    async fn run_zone_pipeline(&self, zone_id: ZoneId, tick_number: u64) {
        if let Err(err) = self.try_run_zone_pipeline(zone_id, tick_number).await {
            warn!(%zone_id, tick_number, error = %err, "zone tick rolled back, zone unaffected and retried next tick");
        }
    }

    async fn try_run_zone_pipeline(
        &self,
        zone_id: ZoneId,
        tick_number: u64,
    ) -> Result<(), FrameworkError> {
        let mut session = self.gateway.begin_zone_session(zone_id).await?;

        let pre_tick = match session.list_entities().await {
            Ok(entities) => entities,
            Err(err) => {
                let _ = session.rollback().await;
                return Err(err.into());
            }
        };

        let intents = self.intents.drain(zone_id).await;

        let tick_result = match self
            .adapter
            .on_tick(zone_id, &pre_tick, &intents, tick_number)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                let _ = session.rollback().await;
                return Err(err.into());
            }
        };

        let created = match session.apply_deltas(&tick_result.deltas).await {
            Ok(created) => created,
            Err(err) => {
                let _ = session.rollback().await;
                return Err(err.into());
            }
        };

        session.commit().await?;

        let snapshot = build_snapshot(pre_tick, &tick_result.deltas, created);
        let base_state = BaseState {
            tick_number,
            entities: snapshot,
            extras: tick_result.extras,
        };
        fanout(zone_id, &self.registry, &self.adapter, &base_state).await;
        Ok(())
    }
}
