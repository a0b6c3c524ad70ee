//! GitHub Octicons from the `@primer/octicons` package
//!
//! The package ships each icon at several pixel sizes (`alert-16.svg`,
//! `alert-24.svg`). Variants are folded into one icon per base name,
//! preferring the 24px rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::store::LoadedIcons;
use crate::providers::svg;
use crate::providers::{IconProvider, IconStore, LibraryDescriptor};

pub const NAME: &str = "octicons";
pub const PACKAGE_DIR: &str = "@primer/octicons";
const SVG_DIR: &str = "build/svg";
const PREFERRED_SIZE: u32 = 24;

/// Static description of this library
pub fn descriptor() -> LibraryDescriptor {
    LibraryDescriptor::new(
        NAME,
        "GitHub Octicons",
        "GitHub's icon set, built for the Primer design system",
        "MIT",
        "https://primer.style/foundations/icons",
    )
}

pub struct OcticonsProvider {
    descriptor: LibraryDescriptor,
    package_dir: PathBuf,
    store: IconStore,
}

impl OcticonsProvider {
    /// Provider reading the package rooted at `package_dir`
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

        // base name -> (pixel size, file)
        let mut variants: BTreeMap<String, (u32, PathBuf)> = BTreeMap::new();
        for path in files {
            let Some(stem) = svg::icon_name_from_path(&path) else {
                continue;
            };
            let (base, size) = split_size_suffix(&stem);
            let replace = match variants.get(base) {
                Some((current, _)) => size_rank(size) > size_rank(*current),
                None => true,
            };
            if replace {
                variants.insert(base.to_string(), (size, path));
            }
        }

        let mut icons = Vec::with_capacity(variants.len());
        for (name, (size, path)) in variants {
            match svg::load_svg_icon(NAME, &name, &path).await {
                Ok(mut icon) => {
                    let style = if name.ends_with("-fill") { "fill" } else { "outline" };
                    icon.style = Some(style.to_string());
                    if size > 0 {
                        icon.size = Some(format!("{size}x{size}"));
                    }
                    icon.source = Some(format!("https://primer.style/foundations/icons/{name}"));
                    icons.push(icon);
                }
                Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
            }
        }

        Ok(LoadedIcons {
            icons,
            version: svg::read_package_version(&self.package_dir).await,
        })
    }
}

#[async_trait]
impl IconProvider for OcticonsProvider {
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

/// `alert-16` -> (`alert`, 16); names without a numeric suffix get size 0
fn split_size_suffix(stem: &str) -> (&str, u32) {
    stem.rsplit_once('-')
        .and_then(|(base, size)| size.parse().ok().map(|size| (base, size)))
        .unwrap_or((stem, 0))
}

fn size_rank(size: u32) -> u32 {
    if size == PREFERRED_SIZE { u32::MAX } else { size }
}
