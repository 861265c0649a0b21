use std::time::Instant;

use dashmap::DashMap;
use scaler_models::ScaleDirection;

/// Key a scaler resource is tracked under: `namespace/name`.
pub type ResourceKey = String;

pub fn resource_key(namespace: &str, name: &str) -> ResourceKey {
    format!("{namespace}/{name}")
}

/// Mutable per-resource scaling history. One entry per scaler resource,
/// created on first reconciliation and discarded on deletion. The controller
/// serializes cycles per resource, so each entry is single-writer.
#[derive(Debug, Clone, Default)]
pub struct ScalerState {
    pub last_observed_replicas: u32,
    pub last_desired_replicas: u32,
    pub last_scale_direction: ScaleDirection,
    /// Anchor of the scale-down cooldown: the last *applied* scale operation.
    pub last_scale_at: Option<Instant>,
    /// Cycles in a row that ended failed or degraded. Reset by the first
    /// fully healthy cycle.
    pub consecutive_failures: u32,
    /// Target read/write failures in a row. Drives retry backoff, so a
    /// degraded metric plugin does not inflate the retry delay.
    pub backoff_attempts: u32,
}

impl ScalerState {
    /// Commit an applied scale operation. Called only after the target write
    /// succeeded, so a failed write never advances the cooldown anchor.
    pub fn record_scale(&mut self, direction: ScaleDirection, now: Instant) {
        self.last_scale_direction = direction;
        self.last_scale_at = Some(now);
    }
}

/// Arena mapping resource identity to its scaling history. No state is ever
/// shared across resources.
#[derive(Clone, Default)]
pub struct StateArena {
    inner: std::sync::Arc<DashMap<ResourceKey, ScalerState>>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the state for `key`, creating a fresh entry on first use.
    pub fn get_or_default(&self, key: &ResourceKey) -> ScalerState {
        self.inner.entry(key.clone()).or_default().clone()
    }

    pub fn put(&self, key: &ResourceKey, state: ScalerState) {
        self.inner.insert(key.clone(), state);
    }

    /// Drop all history for a deleted resource.
    pub fn remove(&self, key: &ResourceKey) {
        self.inner.remove(key);
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn failures(&self, key: &ResourceKey) -> u32 {
        self.inner
            .get(key)
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }
}
