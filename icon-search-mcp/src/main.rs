use anyhow::Result;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use icon_search_mcp::IconSearchMcpService;
use icon_search_mcp::config::ServerConfig;
use icon_search_mcp::providers::{ProviderRegistry, Snapshot};
use icon_search_mcp::search::IconSearchService;

/// MCP server for searching SVG icons across popular icon libraries
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ~/.icon-search-mcp/config.toml when present)
    #[arg(long, env = "ICON_SEARCH_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// node_modules directory containing the icon packages
    #[arg(long, env = "ICON_SEARCH_MCP_NODE_MODULES")]
    node_modules: Option<PathBuf>,

    /// Serve icons from a snapshot file instead of node_modules
    #[arg(long, env = "ICON_SEARCH_MCP_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Comma-separated list of libraries to enable
    #[arg(long, env = "ICON_SEARCH_MCP_LIBRARIES", value_delimiter = ',')]
    libraries: Option<Vec<String>>,

    /// Default cache entry lifetime in seconds
    #[arg(long, env = "ICON_SEARCH_MCP_CACHE_TTL")]
    cache_ttl: Option<u64>,

    /// Maximum number of cache entries
    #[arg(long, env = "ICON_SEARCH_MCP_CACHE_MAX_SIZE")]
    cache_max_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Args {
    /// Load the config file and apply command line overrides
    fn resolve_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;

        if let Some(node_modules) = &self.node_modules {
            config.node_modules = Some(icon_search_mcp::config::expand_path(node_modules)?);
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot = Some(icon_search_mcp::config::expand_path(snapshot)?);
        }
        if let Some(libraries) = &self.libraries {
            config.libraries = Some(libraries.clone());
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache.ttl = Duration::from_secs(ttl);
        }
        if let Some(max_size) = self.cache_max_size {
            config.cache.max_size = max_size;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write every available icon to a snapshot file and exit
    Snapshot {
        /// Destination file
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing to stderr to avoid conflicts with stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = args.resolve_config()?;
    let registry = Arc::new(ProviderRegistry::from_config(&config).await?);
    let report = registry.initialize_all().await;
    if report.all_failed() {
        tracing::warn!("No icon library could be loaded; searches will return no results");
    }

    if let Some(Commands::Snapshot { output }) = args.command {
        let snapshot = Snapshot::from_registry(&registry).await;
        snapshot.save(&output).await?;
        tracing::info!(
            "Wrote {} icons from {} libraries to {}",
            snapshot.total_icons,
            snapshot.libraries.len(),
            output.display()
        );
        return Ok(());
    }

    tracing::info!("Starting icon search MCP server on stdio...");
    let search = Arc::new(IconSearchService::new(registry, config.cache));

    // Serve using stdio transport
    let service = IconSearchMcpService::new(search.clone())
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    tokio::select! {
        result = service.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received ctrl-c, shutting down");
        }
    }

    search.shutdown()?;
    Ok(())
}
