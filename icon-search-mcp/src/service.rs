use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::search::IconSearchService;
use crate::search::tools::{
    AutocompleteParams, GetIconParams, GetLibraryInfoParams, IconTools, SearchByCategoryParams,
    SearchIconsParams, SearchSimilarParams,
};

#[derive(Clone)]
pub struct IconSearchMcpService {
    icon_tools: IconTools,
    tool_router: ToolRouter<Self>,
}

impl IconSearchMcpService {
    pub fn new(search: Arc<IconSearchService>) -> Self {
        Self {
            icon_tools: IconTools::new(search),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl IconSearchMcpService {
    #[tool(
        description = "Search icons across all available libraries (octicons, feather, bootstrap-icons) by name, tag or category. Fuzzy by default and tolerant of typos; set fuzzy=false for plain substring matching. Results are ranked by score where 0 is a perfect match. Use the libraries parameter to restrict the search."
    )]
    pub async fn search_icons(&self, params: Parameters<SearchIconsParams>) -> String {
        self.icon_tools.search_icons(params.0).await
    }

    #[tool(
        description = "Get one icon by exact name and library, including its SVG content, tags, categories and style. Use after search_icons to fetch the icon you picked."
    )]
    pub async fn get_icon(&self, params: Parameters<GetIconParams>) -> String {
        self.icon_tools.get_icon(params.0).await
    }

    #[tool(
        description = "List the icon libraries that are currently available, with icon counts, styles, categories, license and version."
    )]
    pub async fn list_libraries(&self) -> String {
        self.icon_tools.list_libraries().await
    }

    #[tool(
        description = "Get metadata for a single icon library: display name, description, version, icon count, license, styles and categories."
    )]
    pub async fn get_library_info(&self, params: Parameters<GetLibraryInfoParams>) -> String {
        self.icon_tools.get_library_info(params.0).await
    }

    #[tool(
        description = "Browse icons whose category contains the given text (case-insensitive), e.g. 'arrows', 'media', 'communication'. No fuzzy matching; every result has score 0."
    )]
    pub async fn search_by_category(&self, params: Parameters<SearchByCategoryParams>) -> String {
        self.icon_tools.search_by_category(params.0).await
    }

    #[tool(
        description = "Find icons similar to a reference icon, matched through its name and tags. Set same_library_only to stay within the reference icon's library."
    )]
    pub async fn search_similar(&self, params: Parameters<SearchSimilarParams>) -> String {
        self.icon_tools.search_similar(params.0).await
    }

    #[tool(
        description = "Suggest library names, icon names, tags and categories containing a partial query. Queries shorter than 2 characters return no suggestions."
    )]
    pub async fn autocomplete(&self, params: Parameters<AutocompleteParams>) -> String {
        self.icon_tools.autocomplete(params.0).await
    }

    #[tool(description = "Show search cache statistics: size, capacity, hit rate and expired entries.")]
    pub async fn cache_stats(&self) -> String {
        self.icon_tools.cache_stats().await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for IconSearchMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "icon-search-mcp".into(),
                title: Some("Icon Search".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MCP server for finding SVG icons across octicons, feather and bootstrap-icons. Common workflow: search_icons to find candidates (or autocomplete to explore names and tags), then get_icon to fetch the SVG. Use search_similar to find alternatives to an icon you already have, search_by_category to browse a theme, and list_libraries to see what is available.".into(),
            ),
        }
    }
}
