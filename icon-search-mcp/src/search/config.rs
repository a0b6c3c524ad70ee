//! # Search Configuration Module
//!
//! Constants controlling query validation, fuzzy matching defaults and how
//! long the orchestrator memoizes each kind of answer.

use std::time::Duration;

/// Maximum allowed query length in characters
pub const MAX_QUERY_LENGTH: usize = 100;

/// Characters that trigger a warning when present in a query
pub const SUSPICIOUS_QUERY_CHARS: &[char] = &['<', '>', '"', '\''];

/// Default limit for search results
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Largest limit a tool caller may request
pub const MAX_TOOL_LIMIT: usize = 500;

/// Default fuzzy threshold (0 = exact only, 1 = match anything)
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Default threshold for similarity searches
pub const DEFAULT_SIMILAR_THRESHOLD: f64 = 0.4;

/// Default number of similar icons returned
pub const DEFAULT_SIMILAR_LIMIT: usize = 10;

/// Default minimum length of a matched run of characters
pub const DEFAULT_MIN_MATCH_CHAR_LENGTH: usize = 2;

/// Autocomplete defaults
pub const DEFAULT_AUTOCOMPLETE_MIN_QUERY_LENGTH: usize = 2;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;

/// Default key weights
pub const NAME_WEIGHT: f64 = 1.0;
pub const TAGS_WEIGHT: f64 = 0.7;
pub const CATEGORIES_WEIGHT: f64 = 0.5;

/// Characters of distance that add a full point of location penalty
pub const LOCATION_DISTANCE: f64 = 100.0;

/// Penalty applied in proportion to the unmatched share of a field
pub const COVERAGE_PENALTY: f64 = 0.1;

/// Cache lifetimes
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const ICON_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
pub const LIBRARIES_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
pub const AUTOCOMPLETE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
