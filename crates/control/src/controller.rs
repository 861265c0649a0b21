use std::sync::Arc;

use dashmap::DashMap;
use scaler_models::Config;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::metrics::PluginRegistry;
use crate::reconciler::{CycleOutcome, Reconciler};
use crate::state::{ResourceKey, StateArena};
use crate::store::{ResourceEvent, ResourceStore};
use crate::target::TargetAdapter;

/// Drives reconciliation: a timer enqueues every resource each interval,
/// change events enqueue edge-triggered, and a bounded worker pool consumes
/// the queue. Cycles for one resource never overlap; distinct resources run
/// in parallel.
pub struct Controller {
    store: ResourceStore,
    events: mpsc::Receiver<ResourceEvent>,
    reconciler: Arc<Reconciler>,
    arena: StateArena,
    config: Config,
}

impl Controller {
    pub fn new(
        config: Config,
        store: ResourceStore,
        events: mpsc::Receiver<ResourceEvent>,
        registry: Arc<PluginRegistry>,
        adapter: Arc<dyn TargetAdapter>,
    ) -> Self {
        let arena = StateArena::new();
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            arena.clone(),
            registry,
            adapter,
            Backoff::new(&config.backoff),
            config.controller.clone(),
        ));
        Self {
            store,
            events,
            reconciler,
            arena,
            config,
        }
    }

    /// Run until every internal task has stopped (normally: forever).
    pub async fn run(self) {
        let Self {
            store,
            events,
            reconciler,
            arena,
            config,
        } = self;
        let (work_tx, work_rx) = mpsc::channel::<ResourceKey>(config.controller.queue_depth);
        let work_rx = Arc::new(Mutex::new(work_rx));

        // Serialization at the per-resource task boundary: a key present in
        // `inflight` is being reconciled; a concurrent enqueue lands in
        // `pending` and is replayed when the cycle ends.
        let inflight: Arc<DashMap<ResourceKey, ()>> = Arc::new(DashMap::new());
        let pending: Arc<DashMap<ResourceKey, ()>> = Arc::new(DashMap::new());

        let mut tasks = JoinSet::new();

        // Ticker: fixed-cadence re-enqueue of everything in the store.
        {
            let store = store.clone();
            let work_tx = work_tx.clone();
            let interval = config.controller.reconcile_interval();
            tasks.spawn(async move {
                info!(?interval, "reconcile ticker started");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    for key in store.keys() {
                        if work_tx.send(key).await.is_err() {
                            info!("work queue closed, ticker exiting");
                            return;
                        }
                    }
                }
            });
        }

        // Event pump: resource changes re-enqueue, deletions cancel.
        {
            let work_tx = work_tx.clone();
            let arena = arena.clone();
            let pending = pending.clone();
            let mut events = events;
            tasks.spawn(async move {
                while let Some(event) = events.recv().await {
                    match event {
                        ResourceEvent::Applied(key) => {
                            debug!(resource = %key, "change event, enqueueing");
                            if work_tx.send(key).await.is_err() {
                                return;
                            }
                        }
                        ResourceEvent::Deleted(key) => {
                            debug!(resource = %key, "deletion event, discarding state");
                            pending.remove(&key);
                            arena.remove(&key);
                        }
                    }
                }
                info!("resource event stream ended");
            });
        }

        // Worker pool.
        for worker_id in 0..config.controller.workers.max(1) {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let inflight = inflight.clone();
            let pending = pending.clone();
            let store = store.clone();
            let reconciler = reconciler.clone();
            let arena = arena.clone();
            tasks.spawn(async move {
                debug!(worker_id, "reconcile worker started");
                loop {
                    let key = {
                        let mut rx = work_rx.lock().await;
                        match rx.recv().await {
                            Some(key) => key,
                            None => break,
                        }
                    };

                    if !store.contains(&key) {
                        continue;
                    }
                    if inflight.insert(key.clone(), ()).is_some() {
                        // Another worker owns this resource right now.
                        pending.insert(key, ());
                        continue;
                    }

                    let outcome = reconciler.reconcile_once(&key).await;
                    inflight.remove(&key);

                    // A deletion event that raced with this cycle dropped the
                    // arena entry before the cycle wrote it back. Re-check so
                    // state for a deleted resource never outlives it.
                    if !store.contains(&key) {
                        arena.remove(&key);
                        continue;
                    }

                    match outcome {
                        CycleOutcome::RetryAfter(delay) => {
                            let work_tx = work_tx.clone();
                            let retry_key = key.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                let _ = work_tx.send(retry_key).await;
                            });
                        }
                        CycleOutcome::Completed | CycleOutcome::Skipped => {}
                    }

                    // Replay an enqueue that raced with this cycle. Spawned so
                    // a full queue never blocks the consumers that drain it.
                    if pending.remove(&key).is_some() && store.contains(&key) {
                        let work_tx = work_tx.clone();
                        tokio::spawn(async move {
                            let _ = work_tx.send(key).await;
                        });
                    }
                }
                debug!(worker_id, "reconcile worker exiting");
            });
        }

        drop(work_tx);

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "controller task panicked");
            }
        }
    }
}
