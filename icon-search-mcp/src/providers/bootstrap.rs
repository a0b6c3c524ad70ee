//! Bootstrap Icons from the `bootstrap-icons` package

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::store::LoadedIcons;
use crate::providers::svg;
use crate::providers::{IconProvider, IconStore, LibraryDescriptor};

pub const NAME: &str = "bootstrap-icons";
pub const PACKAGE_DIR: &str = "bootstrap-icons";
const SVG_DIR: &str = "icons";
const ICON_SIZE: &str = "16x16";
const FILL_SUFFIX: &str = "-fill";

/// Static description of this library
pub fn descriptor() -> LibraryDescriptor {
    LibraryDescriptor::new(
        NAME,
        "Bootstrap Icons",
        "Free, high quality, open source icon library for Bootstrap",
        "MIT",
        "https://icons.getbootstrap.com",
    )
}

pub struct BootstrapIconsProvider {
    descriptor: LibraryDescriptor,
    package_dir: PathBuf,
    store: IconStore,
}

impl BootstrapIconsProvider {
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

    async fn load(&self) -> Result<LoadedIcons> {
        let files = svg::scan_icon_dir(NAME, &self.package_dir.join(SVG_DIR)).await?;

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

            let style = match name.strip_suffix(FILL_SUFFIX) {
                Some(base) => {
                    // "star-fill" is also found by its outline name
                    if !icon.tags.iter().any(|t| t == base) {
                        icon.tags.push(base.to_string());
                    }
                    "fill"
                }
                None => "outline",
            };
            icon.style = Some(style.to_string());
            icon.size.get_or_insert_with(|| ICON_SIZE.to_string());
            icon.source = Some(format!("https://icons.getbootstrap.com/icons/{name}/"));
            icons.push(icon);
        }

        Ok(LoadedIcons {
            icons,
            version: svg::read_package_version(&self.package_dir).await,
        })
    }
}

#[async_trait]
impl IconProvider for BootstrapIconsProvider {
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
    async fn test_fill_variants_get_fill_style() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let svg_dir = temp_dir.path().join(PACKAGE_DIR).join(SVG_DIR);
        std::fs::create_dir_all(&svg_dir)?;
        std::fs::write(svg_dir.join("star.svg"), "<svg></svg>")?;
        std::fs::write(svg_dir.join("star-fill.svg"), "<svg></svg>")?;

        let provider = BootstrapIconsProvider::from_node_modules(temp_dir.path());
        provider.initialize().await?;

        let fill = provider.search_by_style("fill").await?;
        assert_eq!(fill.len(), 1);
        assert_eq!(fill[0].item.name, "star-fill");
        assert!(fill[0].item.tags.contains(&"star".to_string()));
        assert_eq!(
            fill[0].item.source.as_deref(),
            Some("https://icons.getbootstrap.com/icons/star-fill/")
        );

        let outline = provider.search_by_style("OUTLINE").await?;
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].item.size.as_deref(), Some(ICON_SIZE));

        assert_eq!(provider.get_styles().await, vec!["fill", "outline"]);
        assert!(provider.get_categories().await.contains(&"social".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_by_tags() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let svg_dir = temp_dir.path().join(PACKAGE_DIR).join(SVG_DIR);
        std::fs::create_dir_all(&svg_dir)?;
        std::fs::write(svg_dir.join("star.svg"), "<svg></svg>")?;
        std::fs::write(svg_dir.join("star-fill.svg"), "<svg></svg>")?;
        std::fs::write(svg_dir.join("trash.svg"), "<svg></svg>")?;

        let provider = BootstrapIconsProvider::from_node_modules(temp_dir.path());
        provider.initialize().await?;

        let fill = provider.search_by_tags(&["FILL".to_string()]).await?;
        assert_eq!(fill.len(), 1);
        assert_eq!(fill[0].item.name, "star-fill");
        assert_eq!(fill[0].score, Some(0.0));

        let mut favorites: Vec<String> = provider
            .search_by_tags(&["favorite".to_string(), "garbage".to_string()])
            .await?
            .into_iter()
            .map(|m| m.item.name)
            .collect();
        favorites.sort();
        assert_eq!(favorites, vec!["star", "star-fill", "trash"]);

        assert!(provider.search_by_tags(&["unknown".to_string()]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let svg_dir = temp_dir.path().join(PACKAGE_DIR).join(SVG_DIR);
        std::fs::create_dir_all(&svg_dir)?;
        std::fs::write(svg_dir.join("house.svg"), "<svg></svg>")?;

        let provider = BootstrapIconsProvider::from_node_modules(temp_dir.path());
        provider.initialize().await?;
        std::fs::write(svg_dir.join("gear.svg"), "<svg></svg>")?;
        provider.initialize().await?;

        assert_eq!(provider.get_icon_count().await, 1);
        Ok(())
    }
}
