pub mod cache;
pub mod config;
pub mod error;
pub mod providers;
pub mod search;
pub mod service;
pub mod types;

pub use error::{ErrorCode, IconSearchError};
pub use service::IconSearchMcpService;
