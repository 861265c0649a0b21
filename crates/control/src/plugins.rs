use async_trait::async_trait;
use scaler_models::{ScalerError, TargetRef};
use serde_json::Value;
use tracing::debug;

use crate::metrics::MetricSource;

/// Returns a fixed value from the metric config. Useful for manifests under
/// test and as the simplest possible plugin.
pub struct StaticMetricSource;

#[async_trait]
impl MetricSource for StaticMetricSource {
    async fn read(&self, _target: &TargetRef, config: &Value) -> Result<f64, ScalerError> {
        config
            .get("value")
            .and_then(Value::as_f64)
            .ok_or_else(|| ScalerError::MetricUnavailable {
                plugin: "static".to_string(),
                reason: "config is missing a numeric `value`".to_string(),
            })
    }
}

/// Runs a Prometheus instant query and returns the first vector sample.
pub struct PrometheusMetricSource {
    client: reqwest::Client,
}

impl PrometheusMetricSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for PrometheusMetricSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for PrometheusMetricSource {
    async fn read(&self, target: &TargetRef, config: &Value) -> Result<f64, ScalerError> {
        let unavailable = |reason: String| ScalerError::MetricUnavailable {
            plugin: "prometheus".to_string(),
            reason,
        };

        let url = config
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| unavailable("config is missing `url`".to_string()))?;
        let query = config
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| unavailable("config is missing `query`".to_string()))?;

        debug!(%target, query, "prometheus instant query");

        let response: Value = self
            .client
            .get(format!("{}/api/v1/query", url.trim_end_matches('/')))
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        // Instant query shape: data.result[0].value == [timestamp, "value"].
        response
            .pointer("/data/result/0/value/1")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| unavailable(format!("query {query:?} returned no samples")))
    }
}
