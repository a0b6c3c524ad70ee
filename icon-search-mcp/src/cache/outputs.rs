//! Output types for cache operations
//!
//! These are returned by the cache service and serialized for the
//! `cache_stats` tool.

use serde::{Deserialize, Serialize};

/// Snapshot of cache occupancy and effectiveness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Entries currently stored, including expired ones not yet swept
    pub size: usize,
    pub max_size: usize,
    /// Hits divided by total lookups since the cache was created
    pub hit_rate: f64,
    /// Sum of access counts over the stored entries
    pub total_accesses: u64,
    /// Stored entries that are already past their expiry
    pub expired_entries: usize,
}

impl CacheStats {
    /// Convert to JSON string for MCP response
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize cache stats"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            size: 5,
            max_size: 10,
            hit_rate: 0.5,
            total_accesses: 12,
            expired_entries: 1,
        };

        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(json["maxSize"], 10);
        assert_eq!(json["totalAccesses"], 12);
        assert_eq!(json["hitRate"], 0.5);
    }
}
