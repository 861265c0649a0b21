use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use scaler_models::{MetricReading, MetricSpec, ScalerError, TargetRef};
use tracing::warn;

/// Pull interface implemented by metric providers. Reads must be idempotent
/// with respect to the target; the controller treats the result as an
/// at-least-once, possibly-stale sample.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn read(&self, target: &TargetRef, config: &serde_json::Value)
        -> Result<f64, ScalerError>;
}

/// Named metric sources, resolved once at startup from configuration.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn MetricSource>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, source: Arc<dyn MetricSource>) {
        self.plugins.insert(name.to_string(), source);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MetricSource>> {
        self.plugins.get(name).cloned()
    }

    /// Pull every configured metric for one cycle, concurrently. Each read
    /// carries its own bounded timeout; failures degrade the cycle but never
    /// abort it, so partial results are returned alongside the errors.
    pub async fn collect(
        &self,
        target: &TargetRef,
        metrics: &[MetricSpec],
        timeout: Duration,
    ) -> (Vec<MetricReading>, Vec<ScalerError>) {
        let reads = metrics.iter().map(|spec| async move {
            let Some(plugin) = self.get(&spec.plugin) else {
                warn!(plugin = %spec.plugin, target = %target, "unknown metric plugin");
                return Err(ScalerError::UnknownPlugin {
                    plugin: spec.plugin.clone(),
                });
            };

            match tokio::time::timeout(timeout, plugin.read(target, &spec.config)).await {
                Ok(Ok(value)) => Ok(MetricReading::now(&spec.plugin, value)),
                Ok(Err(e)) => {
                    warn!(plugin = %spec.plugin, target = %target, error = %e, "metric read failed");
                    Err(e)
                }
                Err(_) => {
                    warn!(plugin = %spec.plugin, target = %target, ?timeout, "metric read timed out");
                    Err(ScalerError::MetricUnavailable {
                        plugin: spec.plugin.clone(),
                        reason: format!("timed out after {timeout:?}"),
                    })
                }
            }
        });

        let mut readings = Vec::with_capacity(metrics.len());
        let mut errors = Vec::new();
        for result in future::join_all(reads).await {
            match result {
                Ok(reading) => readings.push(reading),
                Err(e) => errors.push(e),
            }
        }

        (readings, errors)
    }
}
