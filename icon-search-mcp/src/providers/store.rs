//! Icon storage shared by every provider implementation
//!
//! A provider owns one [`IconStore`]. The store tracks the provider's
//! lifecycle (uninitialized, ready, unavailable) and owns the fuzzy index,
//! which is built once from the icons a successful load returns.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{IconSearchError, Result};
use crate::providers::LibraryDescriptor;
use crate::search::fuzzy::FuzzyIndex;
use crate::types::{Icon, LibraryInfo};

/// Icons produced by a source loader
#[derive(Debug, Clone, Default)]
pub struct LoadedIcons {
    pub icons: Vec<Icon>,
    pub version: Option<String>,
}

#[derive(Debug, Default)]
enum StoreState {
    #[default]
    Uninitialized,
    Ready {
        index: Arc<FuzzyIndex>,
        version: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Default)]
pub struct IconStore {
    state: RwLock<StoreState>,
}

impl IconStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `load` unless the store is already ready.
    ///
    /// A failed load leaves the store unavailable with the failure as reason;
    /// a later call retries.
    pub async fn initialize_with<F, Fut>(&self, library: &str, load: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LoadedIcons>>,
    {
        let mut state = self.state.write().await;
        if matches!(*state, StoreState::Ready { .. }) {
            tracing::debug!("Provider {} already initialized", library);
            return Ok(());
        }

        match load().await {
            Ok(loaded) => {
                let index = build_index(library, loaded.icons);
                tracing::info!("Loaded {} icons for {}", index.len(), library);
                *state = StoreState::Ready {
                    index: Arc::new(index),
                    version: loaded.version,
                };
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Provider {} unavailable: {}", library, e);
                *state = StoreState::Unavailable {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Ready and holding at least one icon
    pub async fn is_available(&self) -> bool {
        match &*self.state.read().await {
            StoreState::Ready { index, .. } => !index.is_empty(),
            _ => false,
        }
    }

    /// The current index, or a provider error when the store is not ready
    pub async fn index(&self, library: &str) -> Result<Arc<FuzzyIndex>> {
        match &*self.state.read().await {
            StoreState::Ready { index, .. } => Ok(index.clone()),
            StoreState::Unavailable { reason } => Err(IconSearchError::provider(
                library,
                format!("provider unavailable: {reason}"),
            )),
            StoreState::Uninitialized => Err(IconSearchError::provider(
                library,
                "provider has not been initialized",
            )),
        }
    }

    pub async fn icon_count(&self) -> usize {
        match &*self.state.read().await {
            StoreState::Ready { index, .. } => index.len(),
            _ => 0,
        }
    }

    pub async fn library_info(&self, descriptor: &LibraryDescriptor) -> LibraryInfo {
        let (icon_count, styles, categories, version) = match &*self.state.read().await {
            StoreState::Ready { index, version, .. } => {
                (index.len(), index.styles(), index.categories(), version.clone())
            }
            _ => (0, Vec::new(), Vec::new(), None),
        };

        LibraryInfo {
            name: descriptor.name.clone(),
            display_name: descriptor.display_name.clone(),
            description: descriptor.description.clone(),
            version,
            icon_count,
            license: descriptor.license.clone(),
            styles,
            categories,
            source_url: descriptor.source_url.clone(),
        }
    }
}

/// Drop records that break the icon invariants or repeat a name, then index
fn build_index(library: &str, icons: Vec<Icon>) -> FuzzyIndex {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(icons.len());

    for icon in icons {
        if !icon.is_valid() {
            tracing::warn!("Skipping invalid icon '{}' in {}", icon.name, library);
            continue;
        }
        if !seen.insert(icon.name.clone()) {
            tracing::warn!("Skipping duplicate icon '{}' in {}", icon.name, library);
            continue;
        }
        valid.push(icon);
    }

    FuzzyIndex::new(valid)
}
