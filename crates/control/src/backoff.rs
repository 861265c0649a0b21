use std::time::Duration;

use scaler_models::BackoffSettings;

/// Exponential backoff with jitter and a cap, keyed per resource by its
/// consecutive target-failure count.
#[derive(Clone, Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    jitter: f64,
}

impl Backoff {
    pub fn new(settings: &BackoffSettings) -> Self {
        Self {
            initial: Duration::from_millis(settings.initial_ms),
            max: Duration::from_millis(settings.max_ms),
            multiplier: settings.multiplier,
            jitter: settings.jitter.clamp(0.0, 1.0),
        }
    }

    /// Delay before the next attempt, where `attempt` counts failures so far
    /// (first retry uses `attempt = 1`).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let base = self.initial.as_secs_f64() * self.multiplier.powi(exponent as i32);
        let capped = base.min(self.max.as_secs_f64());

        let jitter_range = capped * self.jitter;
        let jitter = rand::random::<f64>() * jitter_range * 2.0 - jitter_range;

        Duration::from_secs_f64((capped + jitter).clamp(0.0, self.max.as_secs_f64()))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(&BackoffSettings::default())
    }
}
