//! # Providers Module
//!
//! A provider adapts one icon source to the common [`Icon`] schema.
//!
//! ## Key Components
//!
//! - [`IconProvider`] - The capability contract every icon source implements
//! - [`store`] - Shared icon storage and fuzzy index owned by each provider
//! - [`svg`] - SVG scanning plus tag and category heuristics
//! - [`octicons`], [`feather`], [`bootstrap`] - Package-backed providers
//! - [`snapshot`] - Snapshot file format and snapshot-backed provider
//! - [`registry`] - Named collection of providers

pub mod bootstrap;
pub mod feather;
pub mod octicons;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod svg;

use async_trait::async_trait;

use crate::error::Result;
use crate::search::fuzzy::FuzzySearchOptions;
use crate::types::{Icon, LibraryInfo, ScoredMatch};

pub use bootstrap::BootstrapIconsProvider;
pub use feather::FeatherProvider;
pub use octicons::OcticonsProvider;
pub use registry::{InitializationReport, ProviderRegistry};
pub use snapshot::{Snapshot, SnapshotProvider};
pub use store::IconStore;

/// Static description of an icon library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDescriptor {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub license: String,
    pub source_url: String,
}

impl LibraryDescriptor {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        license: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            license: license.into(),
            source_url: source_url.into(),
        }
    }
}

/// Capability contract for one icon source.
///
/// Implementors supply their descriptor, their [`IconStore`] and an
/// `initialize` that fills the store; lookup and search default to the store.
#[async_trait]
pub trait IconProvider: Send + Sync {
    fn descriptor(&self) -> &LibraryDescriptor;

    fn store(&self) -> &IconStore;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Load and normalize the source's icons. Safe to call more than once.
    async fn initialize(&self) -> Result<()>;

    async fn is_available(&self) -> bool {
        self.store().is_available().await
    }

    async fn search_icons(
        &self,
        query: &str,
        options: &FuzzySearchOptions,
    ) -> Result<Vec<ScoredMatch<Icon>>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.search(query, options))
    }

    async fn get_icon(&self, id: &str) -> Result<Option<Icon>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.get(id).cloned())
    }

    async fn get_all_icons(&self) -> Result<Vec<Icon>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.icons().to_vec())
    }

    async fn get_info(&self) -> LibraryInfo {
        self.store().library_info(self.descriptor()).await
    }

    async fn get_icon_count(&self) -> usize {
        self.store().icon_count().await
    }

    async fn get_categories(&self) -> Vec<String> {
        self.store().library_info(self.descriptor()).await.categories
    }

    async fn get_styles(&self) -> Vec<String> {
        self.store().library_info(self.descriptor()).await.styles
    }

    async fn search_by_category(&self, category: &str) -> Result<Vec<ScoredMatch<Icon>>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.filter_by_category(category))
    }

    async fn search_by_style(&self, style: &str) -> Result<Vec<ScoredMatch<Icon>>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.filter_by_style(style))
    }

    async fn search_by_tags(&self, tags: &[String]) -> Result<Vec<ScoredMatch<Icon>>> {
        let index = self.store().index(self.name()).await?;
        Ok(index.filter_by_tags(tags))
    }
}
