use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub backoff: BackoffSettings,
    pub manifests: ManifestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ControllerConfig {
    /// Fixed reconciliation cadence.
    pub reconcile_interval_ms: u64,
    /// Bounded timeout for a single metric plugin read.
    pub plugin_timeout_ms: u64,
    /// Bounded timeout for a target adapter read or write.
    pub adapter_timeout_ms: u64,
    /// Worker tasks consuming the reconcile queue.
    pub workers: usize,
    /// Capacity of the bounded reconcile queue.
    pub queue_depth: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ms: 30_000,
            plugin_timeout_ms: 5_000,
            adapter_timeout_ms: 5_000,
            workers: 4,
            queue_depth: 1_024,
        }
    }
}

impl ControllerConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_millis(self.plugin_timeout_ms)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}

/// Exponential backoff settings for per-resource retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct BackoffSettings {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    /// Random jitter factor in `[0.0, 1.0]`.
    pub jitter: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 300_000,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ManifestConfig {
    /// JSON file of scaler resources loaded into the store at startup.
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: "configs/scalers.json".to_string(),
        }
    }
}
