use scaler_models::{CombineStrategy, MetricReading, PolicySpec};
use tracing::debug;

/// Converts metric readings plus a policy into an unconstrained desired
/// replica count. Clamping and rate limiting are the safety governor's job,
/// keeping the two independently testable.
pub struct PolicyEngine;

impl PolicyEngine {
    /// Returns `None` when no reading is available, which the reconciler
    /// treats as "hold current replicas" and flags the cycle degraded.
    pub fn compute_raw_desired(
        policy: &PolicySpec,
        readings: &[MetricReading],
        current_replicas: u32,
    ) -> Option<u32> {
        if readings.is_empty() {
            return None;
        }
        let raw = match policy {
            PolicySpec::Cost {
                max_cost_per_replica,
                combine,
            } => match combine {
                CombineStrategy::Max => readings
                    .iter()
                    .map(|r| replicas_for_load(r.value, *max_cost_per_replica))
                    .max()
                    .unwrap_or(current_replicas),
                CombineStrategy::Sum => {
                    let total: f64 = readings.iter().map(|r| r.value).sum();
                    replicas_for_load(total, *max_cost_per_replica)
                }
            },
        };
        debug!(raw, current_replicas, "policy computed raw desired");
        Some(raw)
    }
}

fn replicas_for_load(load: f64, max_cost_per_replica: f64) -> u32 {
    // validate() guarantees max_cost_per_replica > 0.
    let required = (load / max_cost_per_replica).ceil();
    if required <= 0.0 {
        0
    } else if required >= u32::MAX as f64 {
        u32::MAX
    } else {
        required as u32
    }
}
