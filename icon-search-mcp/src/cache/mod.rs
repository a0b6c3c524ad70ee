//! # Cache Module
//!
//! In-memory memoization for search results.
//!
//! ## Key Components
//!
//! - [`service`] - Generic TTL cache with LRU eviction and a background sweep
//! - [`outputs`] - Output types for cache statistics

pub mod outputs;
pub mod service;

pub use outputs::CacheStats;
pub use service::CacheService;
