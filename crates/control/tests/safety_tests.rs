use std::time::{Duration, Instant};

use scaler_control::safety::{DecisionReason, SafetyGovernor};
use scaler_control::state::ScalerState;
use scaler_models::{SafetySpec, ScaleDirection};

fn safety(rate: u32, cooldown: Duration) -> SafetySpec {
    SafetySpec {
        max_scale_rate: rate,
        scale_down_cooldown: cooldown,
    }
}

fn after_scale_down(at: Instant) -> ScalerState {
    let mut state = ScalerState::default();
    state.record_scale(ScaleDirection::Down, at);
    state
}

#[test]
fn rate_limit_up() {
    // 5 -> 10 wanted, rate 2 => 7.
    let decision = SafetyGovernor::constrain(
        10,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        5,
        &ScalerState::default(),
        Instant::now(),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 7);
    assert_eq!(decision.reason, DecisionReason::ScaleUp);
    assert_eq!(decision.direction, ScaleDirection::Up);
}

#[test]
fn rate_limit_down() {
    // 10 -> 2 wanted, rate 2 => 8.
    let decision = SafetyGovernor::constrain(
        2,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        10,
        &ScalerState::default(),
        Instant::now(),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 8);
    assert_eq!(decision.direction, ScaleDirection::Down);
}

#[test]
fn clamp_precedes_rate_limit() {
    // Scenario B: raw 20 with maxReplicas 15 bounds to 15 first; the rate
    // then limits the step toward it.
    let decision = SafetyGovernor::constrain(
        20,
        &safety(3, Duration::from_secs(300)),
        1,
        15,
        5,
        &ScalerState::default(),
        Instant::now(),
    );
    assert!(decision.allowed);
    assert_eq!(decision.raw_desired, 20);
    assert_eq!(decision.desired_replicas, 8);
}

#[test]
fn clamp_to_min_replicas() {
    let decision = SafetyGovernor::constrain(
        0,
        &safety(10, Duration::ZERO),
        2,
        15,
        4,
        &ScalerState::default(),
        Instant::now(),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 2);
}

#[test]
fn no_change_is_idempotent() {
    let state = ScalerState::default();
    let decision = SafetyGovernor::constrain(
        5,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        5,
        &state,
        Instant::now(),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 5);
    assert_eq!(decision.reason, DecisionReason::NoChange);
    assert_eq!(decision.direction, ScaleDirection::None);
    // The governor never mutates state; NoChange gives the reconciler
    // nothing to commit, so the cooldown anchor stays put.
    assert!(state.last_scale_at.is_none());
}

#[test]
fn cooldown_blocks_second_scale_down() {
    let t0 = Instant::now();
    let state = after_scale_down(t0);
    let decision = SafetyGovernor::constrain(
        2,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        10,
        &state,
        t0 + Duration::from_secs(20),
    );
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::CooldownActive);
    assert_eq!(decision.desired_replicas, 10);
}

#[test]
fn cooldown_expiry_allows_scale_down() {
    let t0 = Instant::now();
    let state = after_scale_down(t0);
    let decision = SafetyGovernor::constrain(
        2,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        10,
        &state,
        t0 + Duration::from_secs(301),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 8);
}

#[test]
fn scale_up_never_cooldown_gated() {
    let t0 = Instant::now();
    let state = after_scale_down(t0);
    let decision = SafetyGovernor::constrain(
        12,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        10,
        &state,
        t0 + Duration::from_secs(1),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 12);
    assert_eq!(decision.reason, DecisionReason::ScaleUp);
}

#[test]
fn scale_down_after_scale_up_is_immediate() {
    // Cooldown only anchors to a previous applied scale-down.
    let t0 = Instant::now();
    let mut state = ScalerState::default();
    state.record_scale(ScaleDirection::Up, t0);
    let decision = SafetyGovernor::constrain(
        2,
        &safety(2, Duration::from_secs(300)),
        1,
        15,
        10,
        &state,
        t0 + Duration::from_secs(1),
    );
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 8);
}

#[test]
fn scenario_a_stepwise_descent() {
    // currentReplicas=11, raw settles at minReplicas=2, maxScaleRate=1.
    let spec = safety(1, Duration::from_secs(60));
    let t0 = Instant::now();
    let mut state = ScalerState::default();

    // First cycle: one step down, 11 -> 10.
    let d1 = SafetyGovernor::constrain(2, &spec, 2, 15, 11, &state, t0);
    assert!(d1.allowed);
    assert_eq!(d1.desired_replicas, 10);
    state.record_scale(d1.direction, t0);

    // Within the cooldown window the count holds at 10.
    let d2 = SafetyGovernor::constrain(2, &spec, 2, 15, 10, &state, t0 + Duration::from_secs(30));
    assert!(!d2.allowed);
    assert_eq!(d2.desired_replicas, 10);
    assert_eq!(d2.reason, DecisionReason::CooldownActive);

    // After expiry the next single step lands on 9.
    let t2 = t0 + Duration::from_secs(61);
    let d3 = SafetyGovernor::constrain(2, &spec, 2, 15, 10, &state, t2);
    assert!(d3.allowed);
    assert_eq!(d3.desired_replicas, 9);
}

#[test]
fn decisions_are_deterministic() {
    let t0 = Instant::now();
    let state = after_scale_down(t0);
    let spec = safety(3, Duration::from_secs(120));
    let now = t0 + Duration::from_secs(45);
    let first = SafetyGovernor::constrain(4, &spec, 2, 20, 12, &state, now);
    let second = SafetyGovernor::constrain(4, &spec, 2, 20, 12, &state, now);
    assert_eq!(first, second);
}

#[test]
fn zero_cooldown_never_blocks() {
    let t0 = Instant::now();
    let state = after_scale_down(t0);
    let decision = SafetyGovernor::constrain(2, &safety(2, Duration::ZERO), 1, 15, 10, &state, t0);
    assert!(decision.allowed);
    assert_eq!(decision.desired_replicas, 8);
}
