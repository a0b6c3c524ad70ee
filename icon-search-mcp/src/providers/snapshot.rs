//! Pre-built icon snapshots
//!
//! A snapshot is a single JSON file holding every icon of every library,
//! produced by the `snapshot` subcommand. Serving from a snapshot avoids
//! scanning `node_modules` at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{IconSearchError, Result};
use crate::providers::store::LoadedIcons;
use crate::providers::{
    IconProvider, IconStore, LibraryDescriptor, ProviderRegistry, bootstrap, feather, octicons,
};
use crate::types::Icon;

pub const SNAPSHOT_FORMAT_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub generated_at: String,
    pub total_icons: usize,
    pub libraries: Vec<String>,
    /// Package version of each library at capture time
    #[serde(default)]
    pub library_versions: BTreeMap<String, String>,
    pub icons: Vec<Icon>,
}

impl Snapshot {
    pub fn from_icons(icons: Vec<Icon>) -> Self {
        let libraries = icons
            .iter()
            .map(|icon| icon.library.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            version: SNAPSHOT_FORMAT_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_icons: icons.len(),
            libraries,
            library_versions: BTreeMap::new(),
            icons,
        }
    }

    /// Collect the icons of every available provider in the registry
    pub async fn from_registry(registry: &ProviderRegistry) -> Self {
        let mut icons = Vec::new();
        let mut library_versions = BTreeMap::new();
        for provider in registry.get_available_providers().await {
            match provider.get_all_icons().await {
                Ok(provider_icons) => icons.extend(provider_icons),
                Err(e) => {
                    tracing::warn!("Skipping {} in snapshot: {}", provider.name(), e);
                    continue;
                }
            }
            if let Some(version) = provider.get_info().await.version {
                library_versions.insert(provider.name().to_string(), version);
            }
        }

        let mut snapshot = Self::from_icons(icons);
        snapshot.library_versions = library_versions;
        snapshot
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            tracing::warn!(
                "Snapshot {} has format version {}, expected {}",
                path.display(),
                snapshot.version,
                SNAPSHOT_FORMAT_VERSION
            );
        }
        if snapshot.total_icons != snapshot.icons.len() {
            tracing::warn!(
                "Snapshot {} declares {} icons but contains {}",
                path.display(),
                snapshot.total_icons,
                snapshot.icons.len()
            );
        }

        Ok(snapshot)
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        Ok(())
    }

    pub fn icons_for(&self, library: &str) -> Vec<Icon> {
        self.icons
            .iter()
            .filter(|icon| icon.library == library)
            .cloned()
            .collect()
    }
}

/// Serves one library out of a shared snapshot
pub struct SnapshotProvider {
    descriptor: LibraryDescriptor,
    snapshot: Arc<Snapshot>,
    store: IconStore,
}

impl SnapshotProvider {
    pub fn new(descriptor: LibraryDescriptor, snapshot: Arc<Snapshot>) -> Self {
        Self {
            descriptor,
            snapshot,
            store: IconStore::new(),
        }
    }

    /// One provider per library listed in the snapshot
    pub fn for_all_libraries(snapshot: Arc<Snapshot>) -> Vec<Self> {
        snapshot
            .libraries
            .iter()
            .map(|library| Self::new(descriptor_for(library), snapshot.clone()))
            .collect()
    }
}

#[async_trait]
impl IconProvider for SnapshotProvider {
    fn descriptor(&self) -> &LibraryDescriptor {
        &self.descriptor
    }

    fn store(&self) -> &IconStore {
        &self.store
    }

    async fn initialize(&self) -> Result<()> {
        let library = self.descriptor.name.as_str();
        self.store
            .initialize_with(library, || async {
                Ok::<_, IconSearchError>(LoadedIcons {
                    icons: self.snapshot.icons_for(library),
                    version: self.snapshot.library_versions.get(library).cloned(),
                })
            })
            .await
    }
}

/// Descriptor of a known library, or a generic one for anything else
fn descriptor_for(library: &str) -> LibraryDescriptor {
    match library {
        octicons::NAME => octicons::descriptor(),
        feather::NAME => feather::descriptor(),
        bootstrap::NAME => bootstrap::descriptor(),
        other => LibraryDescriptor::new(other, other, format!("{other} icons"), "Unknown", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn icon(name: &str, library: &str) -> Icon {
        Icon::new(name, library, format!("{name}.svg"), "<svg/>")
    }

    #[test]
    fn test_from_icons() {
        let snapshot = Snapshot::from_icons(vec![
            icon("home", "feather"),
            icon("alert", "octicons"),
            icon("star", "feather"),
        ]);
        assert_eq!(snapshot.total_icons, 3);
        assert_eq!(snapshot.libraries, vec!["feather", "octicons"]);
        assert_eq!(snapshot.icons_for("feather").len(), 2);
    }

    #[tokio::test]
    async fn test_save_and_serve() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("out").join("icons.json");
        Snapshot::from_icons(vec![icon("home", "feather"), icon("alert", "octicons")])
            .save(&path)
            .await?;

        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("\"generatedAt\""));
        assert!(raw.contains("\"totalIcons\": 2"));

        let snapshot = Arc::new(Snapshot::load(&path).await?);
        let providers = SnapshotProvider::for_all_libraries(snapshot);
        assert_eq!(providers.len(), 2);

        let feather = &providers[0];
        assert_eq!(feather.descriptor().display_name, "Feather");
        feather.initialize().await?;
        assert_eq!(feather.get_icon_count().await, 1);
        assert!(feather.get_icon("home").await?.is_some());
        assert!(feather.get_icon("alert").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_malformed_fails() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("icons.json");
        std::fs::write(&path, "{not json")?;
        assert!(Snapshot::load(&path).await.is_err());
        Ok(())
    }
}
