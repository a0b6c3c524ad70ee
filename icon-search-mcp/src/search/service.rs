//! Search orchestrator
//!
//! Fans queries out to the available providers, merges and ranks their
//! matches, and memoizes every answer in the shared cache. Search-style entry
//! points never fail: errors come back as a `failed` envelope.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use rmcp::schemars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheService, CacheStats};
use crate::config::CacheConfig;
use crate::error::{ErrorCode, IconSearchError, Result};
use crate::providers::{IconProvider, ProviderRegistry};
use crate::search::config::{
    AUTOCOMPLETE_CACHE_TTL, DEFAULT_AUTOCOMPLETE_MIN_QUERY_LENGTH, DEFAULT_MAX_SUGGESTIONS,
    DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILAR_LIMIT, DEFAULT_SIMILAR_THRESHOLD, ICON_CACHE_TTL,
    LIBRARIES_CACHE_TTL, MAX_QUERY_LENGTH, SEARCH_CACHE_TTL, SUSPICIOUS_QUERY_CHARS,
};
use crate::search::fuzzy::FuzzySearchOptions;
use crate::types::{
    AutocompleteResult, Icon, LibraryInfo, ScoredMatch, SearchResult, SearchType, SimilarResult,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimilarSearchOptions {
    pub limit: usize,
    pub threshold: f64,
    pub exclude_original: bool,
    pub same_library_only: bool,
}

impl Default for SimilarSearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SIMILAR_LIMIT,
            threshold: DEFAULT_SIMILAR_THRESHOLD,
            exclude_original: true,
            same_library_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CategorySearchOptions {
    pub limit: usize,
}

impl Default for CategorySearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AutocompleteOptions {
    pub min_query_length: usize,
    pub max_suggestions: usize,
    pub include_categories: bool,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            min_query_length: DEFAULT_AUTOCOMPLETE_MIN_QUERY_LENGTH,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            include_categories: true,
        }
    }
}

/// Everything the orchestrator memoizes
#[derive(Debug, Clone)]
pub enum CachedValue {
    Search(SearchResult),
    Icon(Icon),
    Libraries(Vec<String>),
    Autocomplete(AutocompleteResult),
}

pub struct IconSearchService {
    registry: Arc<ProviderRegistry>,
    cache: CacheService<CachedValue>,
}

impl IconSearchService {
    pub fn new(registry: Arc<ProviderRegistry>, cache_config: CacheConfig) -> Self {
        Self {
            registry,
            cache: CacheService::new(cache_config),
        }
    }

    /// Fuzzy or exact search across the available providers, optionally
    /// restricted to the named libraries
    pub async fn search_icons(
        &self,
        query: &str,
        options: &FuzzySearchOptions,
        libraries: Option<&[String]>,
    ) -> SearchResult {
        let started = Instant::now();
        match self.try_search_icons(query, options, libraries, started).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", query, e);
                SearchResult::failed(query, e.to_string(), elapsed_ms(started))
            }
        }
    }

    async fn try_search_icons(
        &self,
        query: &str,
        options: &FuzzySearchOptions,
        libraries: Option<&[String]>,
        started: Instant,
    ) -> Result<SearchResult> {
        validate_query(query)?;

        let key = CacheService::<CachedValue>::generate_key([
            "search",
            query,
            verbatim_part(query).as_str(),
            serialize_options(options)?.as_str(),
            filter_key(libraries).as_str(),
        ]);
        if let Some(CachedValue::Search(hit)) = self.cache.get(&key)? {
            tracing::debug!("Cache hit for search '{}'", query);
            return Ok(hit);
        }

        let targets = self.target_providers(libraries).await;
        let (mut matches, search_type) = if options.fuzzy {
            let matches = fan_out(&targets, |p| p.search_icons(query, options)).await?;
            (matches, SearchType::Fuzzy)
        } else {
            let matches = fan_out(&targets, |p| async move {
                p.get_all_icons()
                    .await
                    .map(|icons| exact_matches(&icons, query))
            })
            .await?;
            (matches, SearchType::Exact)
        };

        // Stable: equal scores keep provider order
        matches.sort_by(|a, b| a.sort_score().total_cmp(&b.sort_score()));
        let total_results = matches.len();
        matches.truncate(options.limit);

        let result = SearchResult {
            query: query.to_string(),
            results: matches,
            total_results,
            search_type,
            execution_time_ms: elapsed_ms(started),
            libraries_searched: provider_names(&targets),
            error_message: None,
        };

        self.cache
            .set(&key, CachedValue::Search(result.clone()), Some(SEARCH_CACHE_TTL))?;
        Ok(result)
    }

    /// Exact lookup. Unknown libraries and provider faults are logged and yield `None`.
    pub async fn get_icon(&self, name: &str, library: &str) -> Option<Icon> {
        match self.try_get_icon(name, library).await {
            Ok(icon) => icon,
            Err(e) => {
                tracing::warn!("Failed to get icon {}/{}: {}", library, name, e);
                None
            }
        }
    }

    async fn try_get_icon(&self, name: &str, library: &str) -> Result<Option<Icon>> {
        let key = CacheService::<CachedValue>::generate_key([
            "icon",
            library,
            name,
            verbatim_part(library).as_str(),
            verbatim_part(name).as_str(),
        ]);
        if let Some(CachedValue::Icon(icon)) = self.cache.get(&key)? {
            return Ok(Some(icon));
        }

        let provider = self
            .registry
            .get(library)
            .await
            .ok_or_else(|| IconSearchError::library_not_found(library))?;

        let icon = provider.get_icon(name).await?;
        if let Some(icon) = &icon {
            self.cache
                .set(&key, CachedValue::Icon(icon.clone()), Some(ICON_CACHE_TTL))?;
        }
        Ok(icon)
    }

    /// Names of the providers currently available
    pub async fn get_libraries(&self) -> Result<Vec<String>> {
        let key = CacheService::<CachedValue>::generate_key(["libraries", "all"]);
        if let Some(CachedValue::Libraries(names)) = self.cache.get(&key)? {
            return Ok(names);
        }

        let names = provider_names(&self.registry.get_available_providers().await);
        self.cache
            .set(&key, CachedValue::Libraries(names.clone()), Some(LIBRARIES_CACHE_TTL))?;
        Ok(names)
    }

    /// Metadata for one registered library
    pub async fn get_library_info(&self, library: &str) -> Result<LibraryInfo> {
        let provider = self
            .registry
            .get(library)
            .await
            .ok_or_else(|| IconSearchError::library_not_found(library))?;
        Ok(provider.get_info().await)
    }

    /// Icons resembling a reference icon, found through its name and tags
    pub async fn search_similar(
        &self,
        name: &str,
        library: &str,
        options: &SimilarSearchOptions,
    ) -> Result<SimilarResult> {
        self.try_search_similar(name, library, options)
            .await
            .map_err(|e| {
                if e.is_icon_not_found() {
                    e
                } else {
                    IconSearchError::search(
                        ErrorCode::SimilarSearchFailed,
                        format!("Similar search failed: {e}"),
                    )
                }
            })
    }

    async fn try_search_similar(
        &self,
        name: &str,
        library: &str,
        options: &SimilarSearchOptions,
    ) -> Result<SimilarResult> {
        let started = Instant::now();
        let original = match self.try_get_icon(name, library).await {
            Ok(Some(icon)) => icon,
            Ok(None) => return Err(IconSearchError::icon_not_found(name, library)),
            Err(e) if e.code() == ErrorCode::LibraryNotFound => {
                return Err(IconSearchError::icon_not_found(name, library));
            }
            Err(e) => return Err(e),
        };

        let search_query = similarity_query(&original);
        let search_options = FuzzySearchOptions {
            threshold: options.threshold,
            limit: options.limit.saturating_mul(2),
            ..Default::default()
        };
        let filter = options
            .same_library_only
            .then(|| vec![original.library.clone()]);

        let found = self
            .search_icons(&search_query, &search_options, filter.as_deref())
            .await;
        if found.is_failed() {
            return Err(IconSearchError::search(
                ErrorCode::SearchFailed,
                found
                    .error_message
                    .unwrap_or_else(|| "Search failed".to_string()),
            ));
        }

        let mut results: Vec<ScoredMatch<Icon>> = found
            .results
            .into_iter()
            .filter(|m| {
                !options.exclude_original || !m.item.same_icon(&original.name, &original.library)
            })
            .collect();
        results.truncate(options.limit);

        Ok(SimilarResult {
            original_icon: original,
            search_query,
            total_results: results.len(),
            results,
            execution_time_ms: elapsed_ms(started),
        })
    }

    /// Icons whose categories contain `category`, without fuzzy matching
    pub async fn search_by_category(
        &self,
        category: &str,
        libraries: Option<&[String]>,
        options: &CategorySearchOptions,
    ) -> SearchResult {
        let started = Instant::now();
        match self
            .try_search_by_category(category, libraries, options, started)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Category search for '{}' failed: {}", category, e);
                SearchResult::failed(category, e.to_string(), elapsed_ms(started))
            }
        }
    }

    async fn try_search_by_category(
        &self,
        category: &str,
        libraries: Option<&[String]>,
        options: &CategorySearchOptions,
        started: Instant,
    ) -> Result<SearchResult> {
        if category.trim().is_empty() {
            return Err(IconSearchError::validation(
                "Category cannot be empty",
                Some("category"),
            ));
        }

        let limit = options.limit.to_string();
        let key = CacheService::<CachedValue>::generate_key([
            "category",
            category,
            verbatim_part(category).as_str(),
            limit.as_str(),
            filter_key(libraries).as_str(),
        ]);
        if let Some(CachedValue::Search(hit)) = self.cache.get(&key)? {
            return Ok(hit);
        }

        let targets = self.target_providers(libraries).await;
        let mut matches = fan_out(&targets, |p| p.search_by_category(category)).await?;
        let total_results = matches.len();
        matches.truncate(options.limit);

        let result = SearchResult {
            query: category.to_string(),
            results: matches,
            total_results,
            search_type: SearchType::Filtered,
            execution_time_ms: elapsed_ms(started),
            libraries_searched: provider_names(&targets),
            error_message: None,
        };

        self.cache
            .set(&key, CachedValue::Search(result.clone()), Some(SEARCH_CACHE_TTL))?;
        Ok(result)
    }

    /// Library, icon, tag and category names containing a partial query
    pub async fn get_autocomplete_suggestions(
        &self,
        partial: &str,
        options: &AutocompleteOptions,
    ) -> AutocompleteResult {
        if partial.chars().count() < options.min_query_length {
            return AutocompleteResult::empty(partial);
        }

        match self.try_autocomplete(partial, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Autocomplete for '{}' failed: {}", partial, e);
                AutocompleteResult::empty(partial)
            }
        }
    }

    async fn try_autocomplete(
        &self,
        partial: &str,
        options: &AutocompleteOptions,
    ) -> Result<AutocompleteResult> {
        let key = CacheService::<CachedValue>::generate_key([
            "autocomplete",
            partial,
            verbatim_part(partial).as_str(),
            serialize_options(options)?.as_str(),
        ]);
        if let Some(CachedValue::Autocomplete(hit)) = self.cache.get(&key)? {
            return Ok(hit);
        }

        let needle = partial.to_lowercase();
        let contains = |value: &str| value.to_lowercase().contains(&needle);

        let mut libraries = HashSet::new();
        let mut icons = HashSet::new();
        let mut tags = HashSet::new();
        let mut categories = HashSet::new();

        for provider in self.registry.get_available_providers().await {
            if contains(provider.name()) {
                libraries.insert(provider.name().to_string());
            }
            for icon in provider.get_all_icons().await? {
                if contains(&icon.name) {
                    icons.insert(icon.name.clone());
                }
                tags.extend(icon.tags.iter().filter(|t| contains(t)).cloned());
                if options.include_categories {
                    categories.extend(icon.categories().iter().filter(|c| contains(c)).cloned());
                }
            }
        }

        let limit = options.max_suggestions;
        let result = AutocompleteResult {
            query: partial.to_string(),
            libraries: rank_suggestions(libraries, &needle, limit),
            icons: rank_suggestions(icons, &needle, limit),
            tags: rank_suggestions(tags, &needle, limit),
            categories: rank_suggestions(categories, &needle, limit),
        };

        self.cache.set(
            &key,
            CachedValue::Autocomplete(result.clone()),
            Some(AUTOCOMPLETE_CACHE_TTL),
        )?;
        Ok(result)
    }

    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.get_stats()
    }

    /// Stop the cache sweep and drop all cached answers
    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down icon search service");
        self.cache.destroy()
    }

    /// Available providers, narrowed to `libraries` when given
    async fn target_providers(&self, libraries: Option<&[String]>) -> Vec<Arc<dyn IconProvider>> {
        let mut providers = self.registry.get_available_providers().await;
        if let Some(filter) = normalized_filter(libraries) {
            providers.retain(|p| filter.iter().any(|name| name == p.name()));
        }
        providers
    }
}

/// Call every target concurrently and concatenate the successful answers.
///
/// Individual failures are logged and skipped; when every target fails the
/// whole call fails.
async fn fan_out<'a, T, F, Fut>(targets: &'a [Arc<dyn IconProvider>], call: F) -> Result<Vec<T>>
where
    F: Fn(&'a Arc<dyn IconProvider>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>> + 'a,
{
    let results = join_all(targets.iter().map(call)).await;

    let mut merged = Vec::new();
    let mut failures = Vec::new();
    for (provider, result) in targets.iter().zip(results) {
        match result {
            Ok(items) => merged.extend(items),
            Err(e) => {
                tracing::warn!("Provider {} failed: {}", provider.name(), e);
                failures.push(format!("{}: {}", provider.name(), e));
            }
        }
    }

    if !targets.is_empty() && failures.len() == targets.len() {
        return Err(IconSearchError::provider(
            provider_names(targets).join(","),
            format!("all providers failed ({})", failures.join("; ")),
        ));
    }
    Ok(merged)
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(IconSearchError::invalid_query("Search query cannot be empty"));
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(IconSearchError::invalid_query(format!(
            "Search query too long (max {MAX_QUERY_LENGTH} characters)"
        )));
    }

    // Only logged; the query is searched and echoed as given.
    // TODO: decide whether suspicious characters should be stripped from the searched text
    let sanitized: String = query
        .chars()
        .filter(|c| !SUSPICIOUS_QUERY_CHARS.contains(c))
        .collect();
    if sanitized != query {
        tracing::warn!("Query contains potentially unsafe characters: {}", query);
    }
    Ok(())
}

/// Case-insensitive substring match on name or tags, numbered per provider
fn exact_matches(icons: &[Icon], query: &str) -> Vec<ScoredMatch<Icon>> {
    let needle = query.to_lowercase();
    icons
        .iter()
        .filter(|icon| {
            icon.name.to_lowercase().contains(&needle)
                || icon.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .enumerate()
        .map(|(position, icon)| ScoredMatch::exact(icon.clone(), position))
        .collect()
}

/// Name followed by tags, de-duplicated, cut at a word boundary to the query limit
fn similarity_query(icon: &Icon) -> String {
    let mut query: String = icon.name.chars().take(MAX_QUERY_LENGTH).collect();
    let mut seen: HashSet<&str> = HashSet::from([icon.name.as_str()]);

    for tag in &icon.tags {
        if !seen.insert(tag.as_str()) {
            continue;
        }
        if query.chars().count() + 1 + tag.chars().count() > MAX_QUERY_LENGTH {
            break;
        }
        query.push(' ');
        query.push_str(tag);
    }
    query
}

/// Prefix matches first, then shorter, then alphabetical
fn rank_suggestions(values: HashSet<String>, needle: &str, limit: usize) -> Vec<String> {
    let mut ranked: Vec<String> = values.into_iter().collect();
    ranked.sort_by(|a, b| {
        let a_prefix = !a.to_lowercase().starts_with(needle);
        let b_prefix = !b.to_lowercase().starts_with(needle);
        a_prefix
            .cmp(&b_prefix)
            .then_with(|| a.len().cmp(&b.len()))
            .then_with(|| a.cmp(b))
    });
    ranked.truncate(limit);
    ranked
}

fn normalized_filter(libraries: Option<&[String]>) -> Option<&[String]> {
    libraries.filter(|l| !l.is_empty())
}

fn filter_key(libraries: Option<&[String]>) -> String {
    normalized_filter(libraries)
        .map(|l| verbatim_part(&l.join(",")))
        .unwrap_or_else(|| "all".to_string())
}

/// Hex of the raw bytes. `generate_key` folds case and punctuation, so keys
/// carry this alongside the readable part to stay distinct per input.
fn verbatim_part(value: &str) -> String {
    value.bytes().map(|b| format!("{b:02x}")).collect()
}

fn serialize_options<T: Serialize>(options: &T) -> Result<String> {
    serde_json::to_string(options).map_err(|e| {
        IconSearchError::search(
            ErrorCode::SearchFailed,
            format!("Failed to serialize search options: {e}"),
        )
    })
}

fn provider_names(providers: &[Arc<dyn IconProvider>]) -> Vec<String> {
    providers.iter().map(|p| p.name().to_string()).collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
