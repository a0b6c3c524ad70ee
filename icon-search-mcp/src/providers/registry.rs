//! Named collection of icon providers

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::providers::{
    BootstrapIconsProvider, FeatherProvider, IconProvider, OcticonsProvider, Snapshot,
    SnapshotProvider,
};

/// Where icon packages are looked up when no `node_modules` is configured
pub const DEFAULT_NODE_MODULES: &str = "node_modules";

/// Outcome of [`ProviderRegistry::initialize_all`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitializationReport {
    pub initialized: Vec<String>,
    /// Provider name and failure message
    pub failed: Vec<(String, String)>,
}

impl InitializationReport {
    pub fn all_failed(&self) -> bool {
        self.initialized.is_empty() && !self.failed.is_empty()
    }
}

/// Providers keyed by name, in registration order.
///
/// Registering a name that already exists replaces the earlier provider in place.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn IconProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the providers selected by `config` without initializing them.
    ///
    /// A configured snapshot replaces the package providers entirely.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let registry = Self::new();
        let mut providers: Vec<Arc<dyn IconProvider>> = Vec::new();

        if let Some(path) = &config.snapshot {
            tracing::info!("Serving icons from snapshot {}", path.display());
            let snapshot = Arc::new(Snapshot::load(path).await?);
            providers.extend(
                SnapshotProvider::for_all_libraries(snapshot)
                    .into_iter()
                    .map(|p| Arc::new(p) as Arc<dyn IconProvider>),
            );
        } else {
            let node_modules = config
                .node_modules
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NODE_MODULES));
            tracing::info!("Loading icon packages from {}", node_modules.display());
            providers.push(Arc::new(OcticonsProvider::from_node_modules(&node_modules)));
            providers.push(Arc::new(FeatherProvider::from_node_modules(&node_modules)));
            providers.push(Arc::new(BootstrapIconsProvider::from_node_modules(&node_modules)));
        }

        for provider in providers {
            if config.library_enabled(provider.name()) {
                registry.register(provider).await;
            } else {
                tracing::debug!("Library {} disabled by configuration", provider.name());
            }
        }
        Ok(registry)
    }

    pub async fn register(&self, provider: Arc<dyn IconProvider>) {
        let mut providers = self.providers.write().await;
        match providers.iter().position(|p| p.name() == provider.name()) {
            Some(existing) => {
                tracing::info!("Replacing provider {}", provider.name());
                providers[existing] = provider;
            }
            None => {
                tracing::debug!("Registered provider {}", provider.name());
                providers.push(provider);
            }
        }
    }

    /// Remove a provider by name; false when no such provider was registered
    pub async fn unregister(&self, name: &str) -> bool {
        let mut providers = self.providers.write().await;
        let before = providers.len();
        providers.retain(|p| p.name() != name);
        providers.len() != before
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn IconProvider>> {
        self.providers
            .read()
            .await
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    pub async fn get_all(&self) -> Vec<Arc<dyn IconProvider>> {
        self.providers.read().await.clone()
    }

    pub async fn names(&self) -> Vec<String> {
        self.providers
            .read()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.providers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.providers.read().await.is_empty()
    }

    /// Providers currently reporting themselves available, in registration order
    pub async fn get_available_providers(&self) -> Vec<Arc<dyn IconProvider>> {
        let providers = self.get_all().await;
        let availability = join_all(providers.iter().map(|p| p.is_available())).await;

        providers
            .into_iter()
            .zip(availability)
            .filter_map(|(provider, available)| available.then_some(provider))
            .collect()
    }

    /// Initialize every provider concurrently. One failure does not stop the others.
    pub async fn initialize_all(&self) -> InitializationReport {
        let providers = self.get_all().await;
        let results = join_all(providers.iter().map(|p| p.initialize())).await;

        let mut report = InitializationReport::default();
        for (provider, result) in providers.iter().zip(results) {
            match result {
                Ok(()) => report.initialized.push(provider.name().to_string()),
                Err(e) => {
                    tracing::warn!("Failed to initialize provider {}: {}", provider.name(), e);
                    report.failed.push((provider.name().to_string(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "Initialized {} of {} providers",
            report.initialized.len(),
            providers.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IconSearchError, Result};
    use crate::providers::store::LoadedIcons;
    use crate::providers::{IconStore, LibraryDescriptor};
    use crate::types::Icon;
    use async_trait::async_trait;

    struct StaticProvider {
        descriptor: LibraryDescriptor,
        store: IconStore,
        icons: Vec<Icon>,
        fail: bool,
    }

    impl StaticProvider {
        fn new(name: &str, icon_names: &[&str]) -> Self {
            Self {
                descriptor: LibraryDescriptor::new(name, name, "", "MIT", ""),
                store: IconStore::new(),
                icons: icon_names
                    .iter()
                    .map(|n| Icon::new(*n, name, format!("{n}.svg"), "<svg/>"))
                    .collect(),
                fail: false,
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(name, &[])
            }
        }
    }

    #[async_trait]
    impl IconProvider for StaticProvider {
        fn descriptor(&self) -> &LibraryDescriptor {
            &self.descriptor
        }

        fn store(&self) -> &IconStore {
            &self.store
        }

        async fn initialize(&self) -> Result<()> {
            let name = self.descriptor.name.clone();
            self.store
                .initialize_with(&self.descriptor.name, || async {
                    if self.fail {
                        return Err(IconSearchError::provider(name, "source missing"));
                    }
                    Ok(LoadedIcons {
                        icons: self.icons.clone(),
                        version: None,
                    })
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_register_replaces_in_place() {
        let registry = ProviderRegistry::new();
        registry.register(Arc::new(StaticProvider::new("a", &["x"]))).await;
        registry.register(Arc::new(StaticProvider::new("b", &["y"]))).await;
        registry
            .register(Arc::new(StaticProvider::new("a", &["x", "z"])))
            .await;

        assert_eq!(registry.names().await, vec!["a", "b"]);
        assert_eq!(registry.len().await, 2);

        registry.initialize_all().await;
        let a = registry.get("a").await.expect("provider a");
        assert_eq!(a.get_icon_count().await, 2);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ProviderRegistry::new();
        registry.register(Arc::new(StaticProvider::new("a", &["x"]))).await;

        assert!(registry.unregister("a").await);
        assert!(!registry.unregister("a").await);
        assert!(registry.is_empty().await);
        assert!(registry.get("a").await.is_none());
    }

    #[tokio::test]
    async fn test_from_config_with_node_modules() -> anyhow::Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let feather_dir = temp_dir.path().join("feather-icons/dist/icons");
        std::fs::create_dir_all(&feather_dir)?;
        std::fs::write(feather_dir.join("home.svg"), "<svg></svg>")?;

        let config = ServerConfig {
            node_modules: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config).await?;
        assert_eq!(
            registry.names().await,
            vec!["octicons", "feather", "bootstrap-icons"]
        );

        let report = registry.initialize_all().await;
        assert_eq!(report.initialized, vec!["feather"]);
        assert_eq!(report.failed.len(), 2);

        let config = ServerConfig {
            node_modules: Some(temp_dir.path().to_path_buf()),
            libraries: Some(vec!["feather".to_string()]),
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config).await?;
        assert_eq!(registry.names().await, vec!["feather"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_config_with_snapshot() -> anyhow::Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let path = temp_dir.path().join("icons.json");
        Snapshot::from_icons(vec![
            Icon::new("home", "feather", "home.svg", "<svg/>"),
            Icon::new("alert", "octicons", "alert.svg", "<svg/>"),
        ])
        .save(&path)
        .await?;

        let config = ServerConfig {
            snapshot: Some(path),
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config).await?;
        assert_eq!(registry.names().await, vec!["feather", "octicons"]);

        let report = registry.initialize_all().await;
        assert!(report.failed.is_empty());
        assert_eq!(registry.get_available_providers().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_all_isolates_failures() {
        let registry = ProviderRegistry::new();
        registry.register(Arc::new(StaticProvider::new("good", &["x"]))).await;
        registry.register(Arc::new(StaticProvider::failing("bad"))).await;
        registry.register(Arc::new(StaticProvider::new("empty", &[]))).await;

        let report = registry.initialize_all().await;
        assert_eq!(report.initialized, vec!["good", "empty"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "bad");
        assert!(!report.all_failed());

        let available: Vec<String> = registry
            .get_available_providers()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(available, vec!["good"]);
    }
}
