//! Error taxonomy shared by every core operation
//!
//! Each variant carries a machine-readable code and an HTTP-style status so the
//! tool layer can report failures without inspecting message text.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// Result alias used throughout the search core
pub type Result<T, E = IconSearchError> = std::result::Result<T, E>;

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ProviderError,
    CacheError,
    IconSearchError,
    LibraryNotFound,
    IconNotFound,
    SimilarSearchFailed,
    SearchFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::IconSearchError => "ICON_SEARCH_ERROR",
            ErrorCode::LibraryNotFound => "LIBRARY_NOT_FOUND",
            ErrorCode::IconNotFound => "ICON_NOT_FOUND",
            ErrorCode::SimilarSearchFailed => "SIMILAR_SEARCH_FAILED",
            ErrorCode::SearchFailed => "SEARCH_FAILED",
        }
    }

    /// Default HTTP-style status for this code
    pub fn default_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::LibraryNotFound | ErrorCode::IconNotFound => 404,
            _ => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IconSearchError {
    /// Malformed, oversized or empty input
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A named provider failed to initialize or answer
    #[error("Provider '{provider}' failed: {message}")]
    Provider {
        provider: String,
        message: String,
        status: u16,
    },

    /// The cache store or a cache factory failed
    #[error("Cache operation failed for key '{key}': {message}")]
    Cache {
        key: String,
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Catch-all search failure carrying its own code
    #[error("{message}")]
    Search {
        code: ErrorCode,
        message: String,
        status: u16,
        details: Option<serde_json::Value>,
    },
}

impl IconSearchError {
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Query validation failure, always tagged with the `query` field
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::validation(message, Some("query"))
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status: ErrorCode::ProviderError.default_status(),
        }
    }

    pub fn cache(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cache {
            key: key.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying fault raised while operating on `key`
    pub fn cache_source<E>(key: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Cache {
            key: key.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn search(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Search {
            code,
            message: message.into(),
            status: code.default_status(),
            details: None,
        }
    }

    pub fn library_not_found(library: &str) -> Self {
        Self::Search {
            code: ErrorCode::LibraryNotFound,
            message: format!("Library '{library}' not found"),
            status: ErrorCode::LibraryNotFound.default_status(),
            details: Some(serde_json::json!({ "library": library })),
        }
    }

    pub fn icon_not_found(name: &str, library: &str) -> Self {
        Self::Search {
            code: ErrorCode::IconNotFound,
            message: format!("Icon '{name}' not found in library '{library}'"),
            status: ErrorCode::IconNotFound.default_status(),
            details: Some(serde_json::json!({ "name": name, "library": library })),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Provider { .. } => ErrorCode::ProviderError,
            Self::Cache { .. } => ErrorCode::CacheError,
            Self::Search { code, .. } => *code,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Provider { status, .. } | Self::Search { status, .. } => *status,
            other => other.code().default_status(),
        }
    }

    /// Structured details for reporting
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, .. } => field
                .as_ref()
                .map(|field| serde_json::json!({ "field": field })),
            Self::Provider { provider, .. } => Some(serde_json::json!({ "provider": provider })),
            Self::Cache { key, .. } => Some(serde_json::json!({ "key": key })),
            Self::Search { details, .. } => details.clone(),
        }
    }

    pub fn is_icon_not_found(&self) -> bool {
        self.code() == ErrorCode::IconNotFound
    }
}
