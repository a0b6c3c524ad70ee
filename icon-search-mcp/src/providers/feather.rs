//! Feather icons from the `feather-icons` package

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::store::LoadedIcons;
use crate::providers::svg;
use crate::providers::{IconProvider, IconStore, LibraryDescriptor};

pub const NAME: &str = "feather";
pub const PACKAGE_DIR: &str = "feather-icons";
const SVG_DIR: &str = "dist/icons";
const TAGS_FILE: &str = "dist/tags.json";
const ICON_SIZE: &str = "24x24";

/// Static description of this library
pub fn descriptor() -> LibraryDescriptor {
    LibraryDescriptor::new(
        NAME,
        "Feather",
        "Simply beautiful open source icons",
        "MIT",
        "https://feathericons.com",
    )
}

pub struct FeatherProvider {
    descriptor: LibraryDescriptor,
    package_dir: PathBuf,
    store: IconStore,
}

impl FeatherProvider {
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: descriptor(),
            package_dir: package_dir.into(),
            store: IconStore::new(),
        }
    }

    pub fn from_node_modules(node_modules: &Path) -> Self {
        Self::new(node_modules.join(PACKAGE_DIR))
    }

    /// Curated tags shipped with the package; missing or malformed files yield none
    async fn load_package_tags(&self) -> HashMap<String, Vec<String>> {
        let path = self.package_dir.join(TAGS_FILE);
        let Ok(raw) = tokio::fs::read_to_string(&path).await else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
            HashMap::new()
        })
    }

    async fn load(&self) -> Result<LoadedIcons> {
        let files = svg::scan_icon_dir(NAME, &self.package_dir.join(SVG_DIR)).await?;
        let package_tags = self.load_package_tags().await;

        let mut icons = Vec::with_capacity(files.len());
        for path in files {
            let Some(name) = svg::icon_name_from_path(&path) else {
                continue;
            };
            let mut icon = match svg::load_svg_icon(NAME, &name, &path).await {
                Ok(icon) => icon,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            if let Some(extra) = package_tags.get(&name) {
                for tag in extra.iter().map(|t| t.to_lowercase()) {
                    if !icon.tags.contains(&tag) {
                        icon.tags.push(tag);
                    }
                }
            }
            icon.style = Some("outline".to_string());
            icon.size.get_or_insert_with(|| ICON_SIZE.to_string());
            icon.source = Some(format!("https://feathericons.com/?query={name}"));
            icons.push(icon);
        }

        Ok(LoadedIcons {
            icons,
            version: svg::read_package_version(&self.package_dir).await,
        })
    }
}

#[async_trait]
impl IconProvider for FeatherProvider {
    fn descriptor(&self) -> &LibraryDescriptor {
        &self.descriptor
    }

    fn store(&self) -> &IconStore {
        &self.store
    }

    async fn initialize(&self) -> Result<()> {
        self.store.initialize_with(NAME, || self.load()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_with_package_tags() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let package = temp_dir.path().join(PACKAGE_DIR);
        let svg_dir = package.join(SVG_DIR);
        std::fs::create_dir_all(&svg_dir)?;
        std::fs::write(svg_dir.join("home.svg"), r#"<svg viewBox="0 0 24 24"></svg>"#)?;
        std::fs::write(svg_dir.join("trash-2.svg"), "<svg></svg>")?;
        std::fs::write(package.join(TAGS_FILE), r#"{"home":["Residence"]}"#)?;

        let provider = FeatherProvider::from_node_modules(temp_dir.path());
        provider.initialize().await?;
        assert_eq!(provider.get_icon_count().await, 2);

        let home = provider.get_icon("home").await?.expect("home icon");
        assert!(home.tags.contains(&"residence".to_string()));
        assert_eq!(home.style.as_deref(), Some("outline"));

        let trash = provider.get_icon("trash-2").await?.expect("trash icon");
        assert_eq!(trash.size.as_deref(), Some(ICON_SIZE));
        assert!(trash.tags.contains(&"delete".to_string()));

        let hits = provider.search_by_category("actions").await?;
        assert_eq!(hits.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_package_is_unavailable() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let provider = FeatherProvider::from_node_modules(temp_dir.path());
        assert!(provider.initialize().await.is_err());
        assert!(!provider.is_available().await);
        Ok(())
    }
}
