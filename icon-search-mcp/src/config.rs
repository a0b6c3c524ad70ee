//! Server configuration
//!
//! Values come from an optional TOML file and are overridden by CLI flags
//! (which themselves fall back to `ICON_SEARCH_MCP_*` environment variables).

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the home directory holding the default config file
pub const CONFIG_ROOT_DIR: &str = ".icon-search-mcp";
pub const CONFIG_FILE: &str = "config.toml";

/// Default time-to-live for cache entries (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cache entries
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1000;

/// Default period between expired-entry sweeps (60 seconds)
pub const DEFAULT_CACHE_CHECK_PERIOD: Duration = Duration::from_secs(60);

/// Cache tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(rename = "ttl_secs", with = "duration_secs")]
    pub ttl: Duration,
    pub max_size: usize,
    #[serde(rename = "check_period_secs", with = "duration_secs")]
    pub check_period: Duration,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.check_period.is_zero() {
            bail!("cache.check_period_secs must be greater than zero");
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            max_size: DEFAULT_CACHE_MAX_SIZE,
            check_period: DEFAULT_CACHE_CHECK_PERIOD,
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `node_modules` directory holding the icon packages
    pub node_modules: Option<PathBuf>,
    /// Snapshot file to serve instead of scanning live packages
    pub snapshot: Option<PathBuf>,
    /// Restrict which libraries are registered (all when unset)
    pub libraries: Option<Vec<String>>,
    pub cache: CacheConfig,
}

impl ServerConfig {
    /// Load configuration from an explicit path, or from the default location if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => expand_path(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.node_modules = config.node_modules.map(|p| expand_path(&p)).transpose()?;
        config.snapshot = config.snapshot.map(|p| expand_path(&p)).transpose()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.cache.validate()?;
        Ok(config)
    }

    /// Whether a library should be registered under this configuration
    pub fn library_enabled(&self, name: &str) -> bool {
        self.libraries
            .as_ref()
            .is_none_or(|enabled| enabled.iter().any(|l| l == name))
    }
}

/// `~/.icon-search-mcp/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_ROOT_DIR).join(CONFIG_FILE))
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.cache.check_period, Duration::from_secs(60));
        assert!(config.library_enabled("octicons"));
    }

    #[test]
    fn test_parse_partial_toml() -> Result<()> {
        let config = ServerConfig::from_toml(
            r#"
            libraries = ["feather"]

            [cache]
            ttl_secs = 30
            "#,
        )?;

        assert_eq!(config.cache.ttl, Duration::from_secs(30));
        assert_eq!(config.cache.max_size, DEFAULT_CACHE_MAX_SIZE);
        assert!(config.library_enabled("feather"));
        assert!(!config.library_enabled("octicons"));
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "snapshot = \"/tmp/icons.json\"\n[cache]\nmax_size = 5\n",
        )?;

        let config = ServerConfig::load(Some(&path))?;
        assert_eq!(config.snapshot, Some(PathBuf::from("/tmp/icons.json")));
        assert_eq!(config.cache.max_size, 5);
        Ok(())
    }

    #[test]
    fn test_zero_check_period_is_rejected() -> Result<()> {
        let err = ServerConfig::from_toml("[cache]\ncheck_period_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("check_period_secs"));

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\ncheck_period_secs = 0\n")?;
        let err = ServerConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("check_period_secs"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ServerConfig::load(Some(&temp_dir.path().join("nope.toml"))).is_err());
    }
}
