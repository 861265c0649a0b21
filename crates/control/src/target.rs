use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use scaler_models::{ScalerError, TargetRef};
use tracing::info;

/// Abstraction over the scalable workload: read the current replica count,
/// write the desired one. The underlying object may also be mutated by other
/// actors, so callers must re-read fresh each cycle.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    async fn get_replicas(&self, target: &TargetRef) -> Result<u32, ScalerError>;
    async fn set_replicas(&self, target: &TargetRef, replicas: u32) -> Result<(), ScalerError>;
}

/// In-process adapter backed by a concurrent map. Serves the demo server and
/// the test suite; external edits through [`InMemoryTargets::set`] are
/// absorbed by the reconciler as the new baseline.
#[derive(Clone, Default)]
pub struct InMemoryTargets {
    replicas: Arc<DashMap<TargetRef, u32>>,
}

impl InMemoryTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a target, as an external actor would.
    pub fn set(&self, target: TargetRef, replicas: u32) {
        self.replicas.insert(target, replicas);
    }

    pub fn get(&self, target: &TargetRef) -> Option<u32> {
        self.replicas.get(target).map(|r| *r)
    }

    pub fn remove(&self, target: &TargetRef) {
        self.replicas.remove(target);
    }
}

#[async_trait]
impl TargetAdapter for InMemoryTargets {
    async fn get_replicas(&self, target: &TargetRef) -> Result<u32, ScalerError> {
        self.replicas
            .get(target)
            .map(|r| *r)
            .ok_or_else(|| ScalerError::TargetUnreadable {
                target: target.to_string(),
                reason: "target not found".to_string(),
            })
    }

    async fn set_replicas(&self, target: &TargetRef, replicas: u32) -> Result<(), ScalerError> {
        match self.replicas.get_mut(target) {
            Some(mut entry) => {
                let previous = *entry;
                *entry = replicas;
                info!(%target, previous, replicas, "scaled target");
                Ok(())
            }
            None => Err(ScalerError::TargetWriteFailed {
                target: target.to_string(),
                reason: "target not found".to_string(),
            }),
        }
    }
}
