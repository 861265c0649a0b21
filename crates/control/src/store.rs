use std::sync::Arc;

use dashmap::DashMap;
use scaler_models::{ScalerResource, ScalerStatus};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::state::{resource_key, ResourceKey};

/// Edge-triggered change notification for a scaler resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Applied(ResourceKey),
    Deleted(ResourceKey),
}

/// In-process store of scaler resources, the stand-in for the declarative
/// resource watch. Mutations emit events the controller funnels into its
/// reconcile queue.
#[derive(Clone)]
pub struct ResourceStore {
    resources: Arc<DashMap<ResourceKey, ScalerResource>>,
    events: mpsc::Sender<ResourceEvent>,
}

impl ResourceStore {
    pub fn new() -> (Self, mpsc::Receiver<ResourceEvent>) {
        let (tx, rx) = mpsc::channel(1024); // bounded event queue
        (
            Self {
                resources: Arc::new(DashMap::new()),
                events: tx,
            },
            rx,
        )
    }

    /// Create or replace a resource, preserving any existing status.
    pub async fn apply(&self, mut resource: ScalerResource) {
        let key = resource_key(&resource.meta.namespace, &resource.meta.name);
        if resource.status.is_none() {
            if let Some(existing) = self.resources.get(&key) {
                resource.status = existing.status.clone();
            }
        }
        info!(resource = %key, "applied scaler resource");
        self.resources.insert(key.clone(), resource);
        if self.events.send(ResourceEvent::Applied(key)).await.is_err() {
            warn!("resource event channel closed");
        }
    }

    pub async fn delete(&self, namespace: &str, name: &str) {
        let key = resource_key(namespace, name);
        if self.resources.remove(&key).is_some() {
            info!(resource = %key, "deleted scaler resource");
            if self.events.send(ResourceEvent::Deleted(key)).await.is_err() {
                warn!("resource event channel closed");
            }
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<ScalerResource> {
        self.resources.get(key).map(|r| r.clone())
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.resources.iter().map(|r| r.key().clone()).collect()
    }

    /// Persist server-set status. A no-op if the resource was deleted while
    /// its cycle was in flight.
    pub fn update_status(&self, key: &ResourceKey, status: ScalerStatus) {
        if let Some(mut resource) = self.resources.get_mut(key) {
            resource.status = Some(status);
        }
    }
}
