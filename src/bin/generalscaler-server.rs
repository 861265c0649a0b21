use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use scaler_control::{
    Controller, InMemoryTargets, PluginRegistry, PrometheusMetricSource, ResourceStore,
    StaticMetricSource,
};
use scaler_models::{Config, ScalerResource};
use tokio::signal;
use tracing::{info, warn};

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Try to load from various config locations
    let config_paths = ["configs/default.toml", "config/config.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            info!(path, "loaded configuration");
            return Ok(config);
        }
    }

    Err("No config file found".into())
}

fn load_manifests(path: &str) -> Result<Vec<ScalerResource>> {
    if !Path::new(path).exists() {
        warn!(path, "no scaler manifest file, starting empty");
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    let resources: Vec<ScalerResource> = serde_json::from_str(&contents)?;
    Ok(resources)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().init();

    info!("Starting GeneralScaler server");

    // Load configuration from file or use defaults
    let config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}, using defaults", e);
        Config::default()
    });

    // Plugin registry is resolved once at startup; no runtime lookup of
    // anything that is not registered here.
    let mut registry = PluginRegistry::new();
    registry.register("static", Arc::new(StaticMetricSource));
    registry.register("prometheus", Arc::new(PrometheusMetricSource::new()));
    let registry = Arc::new(registry);

    let targets = InMemoryTargets::new();
    let (store, events) = ResourceStore::new();

    // Seed the store and the demo targets from the manifest file.
    let manifests = load_manifests(&config.manifests.path)?;
    info!(count = manifests.len(), "loaded scaler manifests");
    for resource in manifests {
        if let Err(e) = resource.spec.validate() {
            warn!(
                resource = %format!("{}/{}", resource.meta.namespace, resource.meta.name),
                error = %e,
                "manifest failed validation, applying anyway (reconciler will surface it)"
            );
        }
        targets.set(resource.spec.target_ref.clone(), resource.spec.min_replicas);
        store.apply(resource).await;
    }

    let controller = Controller::new(
        config,
        store,
        events,
        registry,
        Arc::new(targets) as Arc<dyn scaler_control::TargetAdapter>,
    );

    let controller_handle = tokio::spawn(controller.run());

    info!("Controller running; press ctrl-c to stop");
    signal::ctrl_c().await?;
    info!("Shutdown signal received");
    controller_handle.abort();

    Ok(())
}
