//! # Search Module
//!
//! Fuzzy icon matching and the orchestrator that fans queries out across
//! every available icon provider.
//!
//! ## Key Components
//!
//! - [`fuzzy`] - Per-provider fuzzy index built on nucleo-matcher with weighted keys
//! - [`service`] - Search orchestrator: validation, fan-out, ranking and caching
//! - [`tools`] - MCP tool implementations for search operations
//! - [`outputs`] - JSON output types for the tools
//! - [`config`] - Configuration constants for search functionality

pub mod config;
pub mod fuzzy;
pub mod outputs;
pub mod service;
pub mod tools;

pub use fuzzy::{FuzzyIndex, FuzzySearchOptions, SearchField, SearchKey};
pub use service::{
    AutocompleteOptions, CategorySearchOptions, IconSearchService, SimilarSearchOptions,
};
pub use tools::IconTools;
