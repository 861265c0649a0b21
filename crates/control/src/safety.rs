use std::time::Instant;

use scaler_models::{SafetySpec, ScaleDirection};
use tracing::debug;

use crate::state::ScalerState;

/// Why the governor decided what it decided. Surfaced verbatim as the status
/// condition reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    NoChange,
    ScaleUp,
    ScaleDown,
    CooldownActive,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::NoChange => "NoChange",
            DecisionReason::ScaleUp => "ScalingApplied",
            DecisionReason::ScaleDown => "ScalingApplied",
            DecisionReason::CooldownActive => "CooldownActive",
        }
    }
}

/// Output of [`SafetyGovernor::constrain`], consumed once by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleDecision {
    /// Replica count to apply this cycle (already clamped and rate-limited).
    pub desired_replicas: u32,
    /// What the policy asked for before any constraint.
    pub raw_desired: u32,
    pub allowed: bool,
    pub reason: DecisionReason,
    pub direction: ScaleDirection,
}

/// Clamps and gates the policy's raw desired count. Pure: never mutates
/// state, so the same inputs always yield the same decision. The reconciler
/// commits direction/timestamp only after an applied write.
pub struct SafetyGovernor;

impl SafetyGovernor {
    pub fn constrain(
        raw_desired: u32,
        safety: &SafetySpec,
        min_replicas: u32,
        max_replicas: u32,
        current_replicas: u32,
        state: &ScalerState,
        now: Instant,
    ) -> ScaleDecision {
        // Clamp precedes rate limiting.
        let bounded = raw_desired.clamp(min_replicas, max_replicas);

        if bounded == current_replicas {
            return ScaleDecision {
                desired_replicas: current_replicas,
                raw_desired,
                allowed: true,
                reason: DecisionReason::NoChange,
                direction: ScaleDirection::None,
            };
        }

        if bounded > current_replicas {
            // Scale-up is never cooldown-gated.
            let delta = (bounded - current_replicas).min(safety.max_scale_rate);
            let applied = current_replicas + delta;
            debug!(bounded, applied, "scale up permitted");
            return ScaleDecision {
                desired_replicas: applied,
                raw_desired,
                allowed: true,
                reason: DecisionReason::ScaleUp,
                direction: ScaleDirection::Up,
            };
        }

        // Scale down: cooldown applies only when the previous applied scale
        // was also a scale-down.
        if state.last_scale_direction == ScaleDirection::Down {
            if let Some(last) = state.last_scale_at {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < safety.scale_down_cooldown {
                    debug!(?elapsed, cooldown = ?safety.scale_down_cooldown, "cooldown active");
                    return ScaleDecision {
                        desired_replicas: current_replicas,
                        raw_desired,
                        allowed: false,
                        reason: DecisionReason::CooldownActive,
                        direction: ScaleDirection::None,
                    };
                }
            }
        }

        let delta = (current_replicas - bounded).min(safety.max_scale_rate);
        let applied = current_replicas - delta;
        debug!(bounded, applied, "scale down permitted");
        ScaleDecision {
            desired_replicas: applied,
            raw_desired,
            allowed: true,
            reason: DecisionReason::ScaleDown,
            direction: ScaleDirection::Down,
        }
    }
}
