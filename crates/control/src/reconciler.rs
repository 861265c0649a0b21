use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use scaler_models::{
    Condition, ControllerConfig, MetricReading, ScaleDirection, ScalerError, ScalerResource,
    ScalerStatus,
};
use tracing::{info, instrument, warn};

use crate::backoff::Backoff;
use crate::metrics::PluginRegistry;
use crate::policy::PolicyEngine;
use crate::safety::{DecisionReason, SafetyGovernor, ScaleDecision};
use crate::state::{ResourceKey, ScalerState, StateArena};
use crate::store::ResourceStore;
use crate::target::TargetAdapter;

/// Outcome of one reconciliation cycle, consumed by the controller's worker
/// loop to schedule the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle ran to completion; next attempt comes from the regular tick.
    Completed,
    /// Target read/write failed; requeue after the given backoff delay.
    RetryAfter(Duration),
    /// Resource vanished or its spec is invalid; wait for a change event.
    Skipped,
}

/// Runs the evaluate-and-apply pass for single resources. Holds no
/// per-resource mutability of its own; all history lives in the arena, and
/// the controller guarantees cycles for one resource never overlap.
pub struct Reconciler {
    store: ResourceStore,
    arena: StateArena,
    registry: Arc<PluginRegistry>,
    adapter: Arc<dyn TargetAdapter>,
    backoff: Backoff,
    config: ControllerConfig,
}

impl Reconciler {
    pub fn new(
        store: ResourceStore,
        arena: StateArena,
        registry: Arc<PluginRegistry>,
        adapter: Arc<dyn TargetAdapter>,
        backoff: Backoff,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            arena,
            registry,
            adapter,
            backoff,
            config,
        }
    }

    pub fn arena(&self) -> &StateArena {
        &self.arena
    }

    #[instrument(skip(self), fields(resource = %key))]
    pub async fn reconcile_once(&self, key: &ResourceKey) -> CycleOutcome {
        let Some(resource) = self.store.get(key) else {
            // Deleted while queued; nothing to do.
            return CycleOutcome::Skipped;
        };

        if let Err(e) = resource.spec.validate() {
            warn!(error = %e, "rejecting resource with invalid spec");
            self.persist_failure(key, &resource, &e);
            // Terminal-looking until the user corrects the spec; the apply
            // event for the corrected resource re-enqueues it.
            return CycleOutcome::Skipped;
        }

        let mut state = self.arena.get_or_default(key);
        let target = &resource.spec.target_ref;

        // Always re-read fresh: other actors may have edited the target.
        let current_replicas = match self.get_replicas(&resource).await {
            Ok(n) => n,
            Err(e) => {
                state.consecutive_failures += 1;
                state.backoff_attempts += 1;
                let delay = self.backoff.delay_for_attempt(state.backoff_attempts);
                warn!(error = %e, attempt = state.backoff_attempts, ?delay,
                      "target unreadable, backing off");
                if !self.commit(key, state) {
                    return CycleOutcome::Skipped;
                }
                self.persist_failure(key, &resource, &e);
                return CycleOutcome::RetryAfter(delay);
            }
        };

        let (readings, metric_errors) = self
            .registry
            .collect(target, &resource.spec.metrics, self.config.plugin_timeout())
            .await;
        let degraded = !metric_errors.is_empty();

        // No reading at all: hold steady rather than guess.
        let raw_desired =
            PolicyEngine::compute_raw_desired(&resource.spec.policy, &readings, current_replicas)
                .unwrap_or(current_replicas);

        let decision = SafetyGovernor::constrain(
            raw_desired,
            &resource.spec.safety,
            resource.spec.min_replicas,
            resource.spec.max_replicas,
            current_replicas,
            &state,
            Instant::now(),
        );

        let mut applied_replicas = current_replicas;
        let mut scaled_now = false;
        if decision.allowed && decision.desired_replicas != current_replicas {
            if let Err(e) = self.set_replicas(&resource, decision.desired_replicas).await {
                // The cooldown anchor only moves on an applied scale, so a
                // failed write is retried without advancing it.
                state.consecutive_failures += 1;
                state.backoff_attempts += 1;
                let delay = self.backoff.delay_for_attempt(state.backoff_attempts);
                warn!(error = %e, attempt = state.backoff_attempts, ?delay,
                      "target write failed, backing off");
                if !self.commit(key, state) {
                    return CycleOutcome::Skipped;
                }
                self.persist_failure(key, &resource, &e);
                return CycleOutcome::RetryAfter(delay);
            }
            state.record_scale(decision.direction, Instant::now());
            applied_replicas = decision.desired_replicas;
            scaled_now = true;
            info!(
                target = %target,
                from = current_replicas,
                to = applied_replicas,
                raw = decision.raw_desired,
                "applied scale decision"
            );
        }

        state.last_observed_replicas = applied_replicas;
        state.last_desired_replicas = decision.desired_replicas;
        // A degraded metric cycle still reached the target, so the retry
        // attempt counter resets even while the failure streak grows.
        state.backoff_attempts = 0;
        state.consecutive_failures = if degraded {
            state.consecutive_failures + 1
        } else {
            0
        };
        let direction = state.last_scale_direction;
        if !self.commit(key, state) {
            return CycleOutcome::Skipped;
        }

        self.persist_status(
            key,
            &resource,
            applied_replicas,
            &decision,
            direction,
            scaled_now,
            degraded,
            &readings,
            &metric_errors,
        );

        CycleOutcome::Completed
    }

    /// Write the cycle's state back to the arena, unless the resource was
    /// deleted while the cycle ran. A deletion event drops the arena entry,
    /// and an unconditional write here would resurrect it, leaking the entry
    /// and handing a recreated resource a stale cooldown anchor. Returns
    /// whether the resource still exists.
    fn commit(&self, key: &ResourceKey, state: ScalerState) -> bool {
        if self.store.contains(key) {
            self.arena.put(key, state);
            true
        } else {
            self.arena.remove(key);
            false
        }
    }

    async fn get_replicas(&self, resource: &ScalerResource) -> Result<u32, ScalerError> {
        let target = &resource.spec.target_ref;
        tokio::time::timeout(
            self.config.adapter_timeout(),
            self.adapter.get_replicas(target),
        )
        .await
        .map_err(|_| ScalerError::TargetUnreadable {
            target: target.to_string(),
            reason: format!("read timed out after {:?}", self.config.adapter_timeout()),
        })?
    }

    async fn set_replicas(
        &self,
        resource: &ScalerResource,
        replicas: u32,
    ) -> Result<(), ScalerError> {
        let target = &resource.spec.target_ref;
        tokio::time::timeout(
            self.config.adapter_timeout(),
            self.adapter.set_replicas(target, replicas),
        )
        .await
        .map_err(|_| ScalerError::TargetWriteFailed {
            target: target.to_string(),
            reason: format!("write timed out after {:?}", self.config.adapter_timeout()),
        })?
    }

    /// Persist a status that carries the failure as a condition while leaving
    /// the replica figures from the previous cycle untouched.
    fn persist_failure(&self, key: &ResourceKey, resource: &ScalerResource, error: &ScalerError) {
        let previous = resource.status.clone().unwrap_or_default();
        let condition = Condition::not_ready(error.condition_reason(), error.to_string());
        self.store.update_status(
            key,
            ScalerStatus {
                conditions: vec![condition],
                ..previous
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn persist_status(
        &self,
        key: &ResourceKey,
        resource: &ScalerResource,
        applied_replicas: u32,
        decision: &ScaleDecision,
        direction: ScaleDirection,
        scaled_now: bool,
        degraded: bool,
        readings: &[MetricReading],
        metric_errors: &[ScalerError],
    ) {
        let previous = resource.status.clone().unwrap_or_default();
        let last_scale_time = if scaled_now {
            Some(Utc::now())
        } else {
            previous.last_scale_time
        };

        let condition = if degraded {
            let detail = metric_errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Condition::not_ready("MetricUnavailable", detail)
        } else {
            let message = match decision.reason {
                DecisionReason::NoChange => {
                    format!("target steady at {applied_replicas} replicas")
                }
                DecisionReason::CooldownActive => format!(
                    "scale down to {} deferred by cooldown, holding {applied_replicas}",
                    decision.raw_desired
                ),
                _ => format!(
                    "target at {applied_replicas} replicas ({} readings)",
                    readings.len()
                ),
            };
            Condition::ready(decision.reason.as_str(), message)
        };

        self.store.update_status(
            key,
            ScalerStatus {
                current_replicas: applied_replicas,
                desired_replicas: decision.desired_replicas,
                last_scale_time,
                last_scale_direction: direction,
                conditions: vec![condition],
            },
        );
    }
}
