use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::duration::serde_duration;
use crate::error::ScalerError;

/// Identity of the workload a scaler adjusts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TargetRef {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Identity of a scaler resource itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ScalerMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default = "Uuid::new_v4")]
    pub uid: Uuid,
}

/// One configured metric source. `config` is opaque to the controller and
/// handed to the plugin as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MetricSpec {
    pub plugin: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// How multiple metric readings combine into one replica requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CombineStrategy {
    /// The most demanding metric wins (per-metric requirement, then max).
    #[default]
    Max,
    /// Readings are summed before dividing by the per-replica cost.
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PolicySpec {
    #[serde(rename = "cost", rename_all = "camelCase")]
    Cost {
        max_cost_per_replica: f64,
        #[serde(default)]
        combine: CombineStrategy,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SafetySpec {
    /// Maximum replica delta applied within one reconciliation cycle.
    #[serde(deserialize_with = "flexible_u32")]
    pub max_scale_rate: u32,
    /// Minimum elapsed time between consecutive applied scale-downs.
    #[serde(with = "serde_duration")]
    pub scale_down_cooldown: Duration,
}

impl Default for SafetySpec {
    fn default() -> Self {
        Self {
            max_scale_rate: 2,
            scale_down_cooldown: Duration::from_secs(300),
        }
    }
}

/// Manifests may carry integer rates either as numbers or as strings; both
/// must parse deterministically.
fn flexible_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(u32),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(v) => Ok(v),
        IntOrString::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid integer rate: {s:?}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ScalerSpec {
    pub target_ref: TargetRef,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub metrics: Vec<MetricSpec>,
    pub policy: PolicySpec,
    #[serde(default)]
    pub safety: SafetySpec,
}

impl ScalerSpec {
    /// Admission-time validation. A spec that fails here is skipped until the
    /// user corrects it.
    pub fn validate(&self) -> Result<(), ScalerError> {
        if self.min_replicas > self.max_replicas {
            return Err(ScalerError::InvalidSpec {
                reason: format!(
                    "minReplicas ({}) must not exceed maxReplicas ({})",
                    self.min_replicas, self.max_replicas
                ),
            });
        }
        match self.policy {
            PolicySpec::Cost {
                max_cost_per_replica,
                ..
            } => {
                if !(max_cost_per_replica > 0.0) || !max_cost_per_replica.is_finite() {
                    return Err(ScalerError::InvalidSpec {
                        reason: format!(
                            "maxCostPerReplica must be a positive number, got {max_cost_per_replica}"
                        ),
                    });
                }
            }
        }
        if self.safety.max_scale_rate < 1 {
            return Err(ScalerError::InvalidSpec {
                reason: "maxScaleRate must be at least 1".to_string(),
            });
        }
        if self.metrics.iter().any(|m| m.plugin.trim().is_empty()) {
            return Err(ScalerError::InvalidSpec {
                reason: "metric plugin name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDirection {
    Up,
    Down,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: bool,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn ready(reason: &str, message: String) -> Self {
        Self {
            type_: "Ready".to_string(),
            status: true,
            reason: reason.to_string(),
            message,
            last_transition_time: Utc::now(),
        }
    }

    pub fn not_ready(reason: &str, message: String) -> Self {
        Self {
            status: false,
            ..Self::ready(reason, message)
        }
    }
}

/// Server-set status of a scaler resource, persisted at the end of every
/// reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScalerStatus {
    pub current_replicas: u32,
    pub desired_replicas: u32,
    pub last_scale_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_scale_direction: ScaleDirection,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalerResource {
    pub meta: ScalerMeta,
    pub spec: ScalerSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScalerStatus>,
}

/// One metric sample, produced fresh each cycle and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    pub plugin: String,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

impl MetricReading {
    pub fn now(plugin: &str, value: f64) -> Self {
        Self {
            plugin: plugin.to_string(),
            value,
            observed_at: Utc::now(),
        }
    }
}
