use std::sync::Arc;

use rmcp::schemars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::IconSearchError;
use crate::search::config::{DEFAULT_SEARCH_LIMIT, MAX_TOOL_LIMIT};
use crate::search::fuzzy::{FuzzySearchOptions, SearchKey};
use crate::search::outputs::{ErrorOutput, GetIconOutput, ListLibrariesOutput, to_json};
use crate::search::service::{
    AutocompleteOptions, CategorySearchOptions, IconSearchService, SimilarSearchOptions,
};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchIconsParams {
    #[schemars(description = "What to look for, e.g. 'arrow left' or 'trash'")]
    pub query: String,
    #[schemars(description = "Only search these libraries (e.g. ['octicons', 'feather'])")]
    pub libraries: Option<Vec<String>>,
    #[schemars(description = "Maximum number of results to return (default 50)")]
    pub limit: Option<usize>,
    #[schemars(description = "Match strictness from 0 (exact) to 1 (anything), default 0.3")]
    pub threshold: Option<f64>,
    #[schemars(description = "Fuzzy matching when true (default), substring matching when false")]
    pub fuzzy: Option<bool>,
    #[schemars(description = "Include matched character ranges in each result")]
    pub include_matches: Option<bool>,
    #[schemars(
        description = "Parse the query with operators: 'exact, ^prefix, suffix$, !exclude"
    )]
    pub use_extended_search: Option<bool>,
    #[schemars(description = "Fields to match and their weights (default name, tags, categories)")]
    pub keys: Option<Vec<SearchKey>>,
    #[schemars(description = "Match case exactly")]
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetIconParams {
    #[schemars(description = "The icon name, e.g. 'arrow-left'")]
    pub name: String,
    #[schemars(description = "The library the icon belongs to, e.g. 'feather'")]
    pub library: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetLibraryInfoParams {
    #[schemars(description = "The library name, e.g. 'bootstrap-icons'")]
    pub library: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchByCategoryParams {
    #[schemars(description = "Category to browse, e.g. 'arrows' or 'communication'")]
    pub category: String,
    #[schemars(description = "Only search these libraries")]
    pub libraries: Option<Vec<String>>,
    #[schemars(description = "Maximum number of results to return (default 50)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSimilarParams {
    #[schemars(description = "Name of the reference icon")]
    pub name: String,
    #[schemars(description = "Library of the reference icon")]
    pub library: String,
    #[schemars(description = "Maximum number of similar icons (default 10)")]
    pub limit: Option<usize>,
    #[schemars(description = "Match strictness from 0 to 1, default 0.4")]
    pub threshold: Option<f64>,
    #[schemars(description = "Drop the reference icon from the results (default true)")]
    pub exclude_original: Option<bool>,
    #[schemars(description = "Only look in the reference icon's library (default false)")]
    pub same_library_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AutocompleteParams {
    #[schemars(description = "Partial query, at least 2 characters")]
    pub partial_query: String,
    #[schemars(description = "Maximum suggestions per group (default 10)")]
    pub max_suggestions: Option<usize>,
    #[schemars(description = "Include category suggestions (default true)")]
    pub include_categories: Option<bool>,
}

#[derive(Clone)]
pub struct IconTools {
    service: Arc<IconSearchService>,
}

impl IconTools {
    pub fn new(service: Arc<IconSearchService>) -> Self {
        Self { service }
    }

    pub async fn search_icons(&self, params: SearchIconsParams) -> String {
        let limit = match checked_limit(params.limit, DEFAULT_SEARCH_LIMIT) {
            Ok(limit) => limit,
            Err(e) => return ErrorOutput::from(&e).to_json(),
        };

        let defaults = FuzzySearchOptions::default();
        let options = FuzzySearchOptions {
            fuzzy: params.fuzzy.unwrap_or(defaults.fuzzy),
            threshold: params.threshold.unwrap_or(defaults.threshold).clamp(0.0, 1.0),
            limit,
            include_matches: params.include_matches.unwrap_or(defaults.include_matches),
            use_extended_search: params
                .use_extended_search
                .unwrap_or(defaults.use_extended_search),
            is_case_sensitive: params.case_sensitive.unwrap_or(defaults.is_case_sensitive),
            keys: params.keys.unwrap_or(defaults.keys.clone()),
            ..defaults
        };

        let result = self
            .service
            .search_icons(&params.query, &options, params.libraries.as_deref())
            .await;
        to_json(&result)
    }

    pub async fn get_icon(&self, params: GetIconParams) -> String {
        match self.service.get_icon(&params.name, &params.library).await {
            Some(icon) => to_json(&GetIconOutput { icon }),
            None => {
                ErrorOutput::from(&IconSearchError::icon_not_found(&params.name, &params.library))
                    .to_json()
            }
        }
    }

    pub async fn list_libraries(&self) -> String {
        let names = match self.service.get_libraries().await {
            Ok(names) => names,
            Err(e) => return ErrorOutput::from(&e).to_json(),
        };

        let mut libraries = Vec::with_capacity(names.len());
        for name in &names {
            match self.service.get_library_info(name).await {
                Ok(info) => libraries.push(info),
                // Unregistered since the names were cached
                Err(e) => tracing::debug!("Skipping library {}: {}", name, e),
            }
        }

        to_json(&ListLibrariesOutput {
            total_libraries: libraries.len(),
            libraries,
        })
    }

    pub async fn get_library_info(&self, params: GetLibraryInfoParams) -> String {
        match self.service.get_library_info(&params.library).await {
            Ok(info) => to_json(&info),
            Err(e) => ErrorOutput::from(&e).to_json(),
        }
    }

    pub async fn search_by_category(&self, params: SearchByCategoryParams) -> String {
        let limit = match checked_limit(params.limit, DEFAULT_SEARCH_LIMIT) {
            Ok(limit) => limit,
            Err(e) => return ErrorOutput::from(&e).to_json(),
        };

        let result = self
            .service
            .search_by_category(
                &params.category,
                params.libraries.as_deref(),
                &CategorySearchOptions { limit },
            )
            .await;
        to_json(&result)
    }

    pub async fn search_similar(&self, params: SearchSimilarParams) -> String {
        let defaults = SimilarSearchOptions::default();
        let limit = match checked_limit(params.limit, defaults.limit) {
            Ok(limit) => limit,
            Err(e) => return ErrorOutput::from(&e).to_json(),
        };

        let options = SimilarSearchOptions {
            limit,
            threshold: params.threshold.unwrap_or(defaults.threshold).clamp(0.0, 1.0),
            exclude_original: params.exclude_original.unwrap_or(defaults.exclude_original),
            same_library_only: params.same_library_only.unwrap_or(defaults.same_library_only),
        };

        match self
            .service
            .search_similar(&params.name, &params.library, &options)
            .await
        {
            Ok(result) => to_json(&result),
            Err(e) => ErrorOutput::from(&e).to_json(),
        }
    }

    pub async fn autocomplete(&self, params: AutocompleteParams) -> String {
        let defaults = AutocompleteOptions::default();
        let options = AutocompleteOptions {
            max_suggestions: params.max_suggestions.unwrap_or(defaults.max_suggestions),
            include_categories: params
                .include_categories
                .unwrap_or(defaults.include_categories),
            ..defaults
        };

        let result = self
            .service
            .get_autocomplete_suggestions(&params.partial_query, &options)
            .await;
        to_json(&result)
    }

    pub async fn cache_stats(&self) -> String {
        match self.service.cache_stats() {
            Ok(stats) => stats.to_json(),
            Err(e) => ErrorOutput::from(&e).to_json(),
        }
    }
}

fn checked_limit(limit: Option<usize>, default: usize) -> Result<usize, IconSearchError> {
    let limit = limit.unwrap_or(default);
    if limit == 0 || limit > MAX_TOOL_LIMIT {
        return Err(IconSearchError::validation(
            format!("Limit must be between 1 and {MAX_TOOL_LIMIT}"),
            Some("limit"),
        ));
    }
    Ok(limit)
}
