use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("Metric plugin {plugin} unavailable: {reason}")]
    MetricUnavailable { plugin: String, reason: String },

    #[error("Unknown metric plugin: {plugin}")]
    UnknownPlugin { plugin: String },

    #[error("Failed to read target {target}: {reason}")]
    TargetUnreadable { target: String, reason: String },

    #[error("Failed to write target {target}: {reason}")]
    TargetWriteFailed { target: String, reason: String },

    #[error("Invalid scaler spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("Invalid duration string: {input}")]
    InvalidDuration { input: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },
}

impl ScalerError {
    /// Retryable errors are requeued with backoff; the rest wait for the user
    /// to correct the resource.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScalerError::MetricUnavailable { .. } => true,
            ScalerError::TargetUnreadable { .. } => true,
            ScalerError::TargetWriteFailed { .. } => true,
            ScalerError::UnknownPlugin { .. } => false,
            ScalerError::InvalidSpec { .. } => false,
            ScalerError::InvalidDuration { .. } => false,
            ScalerError::ConfigError { .. } => false,
        }
    }

    /// Condition reason string surfaced on the resource status.
    pub fn condition_reason(&self) -> &'static str {
        match self {
            ScalerError::MetricUnavailable { .. } => "MetricUnavailable",
            ScalerError::UnknownPlugin { .. } => "MetricUnavailable",
            ScalerError::TargetUnreadable { .. } => "TargetUnreadable",
            ScalerError::TargetWriteFailed { .. } => "TargetWriteFailed",
            ScalerError::InvalidSpec { .. } => "InvalidSpec",
            ScalerError::InvalidDuration { .. } => "InvalidSpec",
            ScalerError::ConfigError { .. } => "ConfigError",
        }
    }
}
