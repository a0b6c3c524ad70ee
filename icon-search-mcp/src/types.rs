//! Domain types shared by providers, the orchestrator and the tool layer
//!
//! All of these serialize as camelCase JSON, the same shape used by the
//! snapshot file.

use serde::{Deserialize, Serialize};

/// One searchable icon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    pub name: String,
    pub library: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Icon {
    pub fn new(
        name: impl Into<String>,
        library: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            library: library.into(),
            tags: Vec::new(),
            style: None,
            path: path.into(),
            content: content.into(),
            categories: None,
            size: None,
            source: None,
            updated_at: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Whether the record satisfies the invariants required before it may leave a provider
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.library.trim().is_empty()
            && !self.path.trim().is_empty()
            && !self.content.trim().is_empty()
    }

    /// Natural key comparison
    pub fn same_icon(&self, name: &str, library: &str) -> bool {
        self.name == name && self.library == library
    }

    pub fn categories(&self) -> &[String] {
        self.categories.as_deref().unwrap_or(&[])
    }
}

/// Character ranges (inclusive) of one field that matched a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpan {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub indices: Vec<(usize, usize)>,
}

/// A search hit. Scores run from 0 (perfect) to 1 (no match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch<T> {
    pub item: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_spans: Option<Vec<MatchSpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
}

impl<T> ScoredMatch<T> {
    /// A filter hit: perfect score at the given enumeration position
    pub fn exact(item: T, original_index: usize) -> Self {
        Self {
            item,
            score: Some(0.0),
            match_spans: None,
            original_index: Some(original_index),
        }
    }

    /// Score used for ordering; unscored matches rank as perfect
    pub fn sort_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Fuzzy,
    Exact,
    Filtered,
    Failed,
}

/// Envelope returned by every search entry point, success or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<ScoredMatch<Icon>>,
    pub total_results: usize,
    pub search_type: SearchType,
    pub execution_time_ms: u64,
    pub libraries_searched: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SearchResult {
    pub fn failed(query: impl Into<String>, message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            total_results: 0,
            search_type: SearchType::Failed,
            execution_time_ms: elapsed_ms,
            libraries_searched: Vec::new(),
            error_message: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.search_type == SearchType::Failed
    }
}

/// Result of a similarity search around a reference icon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarResult {
    pub original_icon: Icon,
    pub search_query: String,
    pub results: Vec<ScoredMatch<Icon>>,
    pub total_results: usize,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteResult {
    pub query: String,
    pub libraries: Vec<String>,
    pub icons: Vec<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl AutocompleteResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
            && self.icons.is_empty()
            && self.tags.is_empty()
            && self.categories.is_empty()
    }
}

/// Descriptive metadata for one icon library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub icon_count: usize,
    pub license: String,
    pub styles: Vec<String>,
    pub categories: Vec<String>,
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_validity() {
        let icon = Icon::new("home", "feather", "icons/home.svg", "<svg/>");
        assert!(icon.is_valid());

        let missing_content = Icon::new("home", "feather", "icons/home.svg", "");
        assert!(!missing_content.is_valid());

        let missing_name = Icon::new(" ", "feather", "icons/home.svg", "<svg/>");
        assert!(!missing_name.is_valid());
    }

    #[test]
    fn test_icon_serializes_camel_case() {
        let mut icon = Icon::new("home", "feather", "icons/home.svg", "<svg/>")
            .with_tags(["House", "building"]);
        icon.updated_at = Some("2024-01-01T00:00:00Z".to_string());

        let json = serde_json::to_value(&icon).unwrap();
        assert_eq!(json["updatedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["tags"], serde_json::json!(["house", "building"]));
        assert!(json.get("style").is_none());
    }

    #[test]
    fn test_failed_envelope() {
        let result = SearchResult::failed("", "Search query cannot be empty", 0);
        assert!(result.is_failed());
        assert!(result.results.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["searchType"], "failed");
        assert_eq!(json["errorMessage"], "Search query cannot be empty");
    }
}
