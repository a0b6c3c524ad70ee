//! SVG source helpers shared by the package-backed providers
//!
//! Providers compose these functions rather than inheriting behavior: scanning
//! a directory for SVG files, deriving search tags from file names, guessing
//! categories, and reading package metadata.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{IconSearchError, Result};
use crate::types::Icon;

/// Extra search terms attached to an icon whose name contains the key
const TAG_SYNONYMS: &[(&str, &[&str])] = &[
    ("home", &["house", "building", "main"]),
    ("house", &["home", "building"]),
    ("trash", &["delete", "remove", "bin", "garbage"]),
    ("x", &["close", "cancel", "remove"]),
    ("search", &["find", "magnify", "lookup"]),
    ("gear", &["settings", "preferences", "cog"]),
    ("settings", &["gear", "preferences", "cog"]),
    ("person", &["user", "account", "profile"]),
    ("user", &["person", "account", "profile"]),
    ("mail", &["email", "envelope", "message"]),
    ("envelope", &["email", "mail", "message"]),
    ("pencil", &["edit", "write", "modify"]),
    ("edit", &["pencil", "modify"]),
    ("heart", &["love", "like", "favorite"]),
    ("star", &["favorite", "bookmark", "rating"]),
    ("bell", &["notification", "alert"]),
    ("lock", &["security", "password", "private"]),
    ("eye", &["view", "visible", "watch"]),
    ("plus", &["add", "new", "create"]),
    ("download", &["save", "import"]),
    ("upload", &["export", "share"]),
    ("check", &["done", "ok", "success", "confirm"]),
    ("alert", &["warning", "error", "danger"]),
    ("calendar", &["date", "schedule", "event"]),
    ("clock", &["time", "schedule"]),
];

/// Category assigned when a name or tag contains one of the keywords
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("arrows", &["arrow", "chevron", "caret"]),
    ("navigation", &["home", "house", "menu", "compass", "map", "sidebar"]),
    ("communication", &["mail", "envelope", "chat", "message", "phone", "comment", "inbox"]),
    ("files", &["file", "folder", "document", "archive", "clipboard"]),
    ("media", &["play", "pause", "video", "camera", "image", "music", "volume", "film"]),
    ("devices", &["device", "laptop", "phone", "tablet", "monitor", "cpu", "printer"]),
    ("actions", &["trash", "delete", "edit", "pencil", "plus", "download", "upload", "copy", "save"]),
    ("alerts", &["alert", "bell", "warning", "notification", "info", "bug"]),
    ("users", &["person", "people", "user", "account", "profile"]),
    ("security", &["lock", "unlock", "key", "shield"]),
    ("development", &["code", "git", "terminal", "branch", "commit", "repo"]),
    ("commerce", &["cart", "bag", "credit", "shop", "wallet", "dollar"]),
    ("weather", &["sun", "moon", "cloud", "rain", "snow", "wind"]),
    ("social", &["heart", "star", "thumbs", "share", "like"]),
    ("time", &["clock", "calendar", "stopwatch", "hourglass"]),
];

pub const UNCATEGORIZED: &str = "general";

static WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<svg[^>]*\swidth="(\d+)(?:px)?""#).expect("valid regex"));
static HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<svg[^>]*\sheight="(\d+)(?:px)?""#).expect("valid regex"));
static VIEWBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"viewBox="[-\d.]+\s+[-\d.]+\s+([\d.]+)\s+([\d.]+)""#).expect("valid regex")
});

/// Recursively collect `.svg` files below `dir`, sorted by path
pub async fn scan_svg_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// [`scan_svg_files`] with failures reported as a provider error for `library`
pub async fn scan_icon_dir(library: &str, dir: &Path) -> Result<Vec<PathBuf>> {
    scan_svg_files(dir).await.map_err(|e| {
        IconSearchError::provider(
            library,
            format!("failed to read icon directory {}: {e}", dir.display()),
        )
    })
}

/// File stem of an SVG path
pub fn icon_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// Lowercase tags: the name itself, its word parts, and known synonyms
pub fn tags_from_name(name: &str) -> Vec<String> {
    let name = name.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: &str| {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    };

    push(&name);
    let words: Vec<&str> = name
        .split(['-', '_', ' ', '.'])
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .collect();
    for word in &words {
        push(word);
    }
    for word in &words {
        if let Some((_, synonyms)) = TAG_SYNONYMS.iter().find(|(key, _)| key == word) {
            for synonym in *synonyms {
                push(synonym);
            }
        }
    }

    tags
}

/// Categories whose keywords appear in the name or tags
pub fn categorize(name: &str, tags: &[String]) -> Vec<String> {
    let name = name.to_lowercase();
    let categories: BTreeSet<&str> = CATEGORY_RULES
        .iter()
        .filter(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| name.contains(k) || tags.iter().any(|t| t == k))
        })
        .map(|(category, _)| *category)
        .collect();

    if categories.is_empty() {
        vec![UNCATEGORIZED.to_string()]
    } else {
        categories.into_iter().map(str::to_string).collect()
    }
}

/// Rendered size such as `24x24`, from width/height attributes or the viewBox
pub fn svg_dimensions(content: &str) -> Option<String> {
    let width = WIDTH_RE.captures(content).map(|c| c[1].to_string());
    let height = HEIGHT_RE.captures(content).map(|c| c[1].to_string());
    if let (Some(width), Some(height)) = (width, height) {
        return Some(format!("{width}x{height}"));
    }

    VIEWBOX_RE.captures(content).map(|c| {
        let trim = |v: &str| v.trim_end_matches(".0").to_string();
        format!("{}x{}", trim(&c[1]), trim(&c[2]))
    })
}

/// Last-modified time of a file as RFC 3339
pub async fn modified_timestamp(path: &Path) -> Option<String> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified).to_rfc3339())
}

/// `version` field of `package.json` in `package_dir`, if readable
pub async fn read_package_version(package_dir: &Path) -> Option<String> {
    let raw = tokio::fs::read_to_string(package_dir.join("package.json"))
        .await
        .ok()?;
    let json: serde_json::Value = serde_json::from_str(&raw).ok()?;
    json.get("version")?.as_str().map(str::to_string)
}

/// Read one SVG file into an icon with heuristic tags, categories and size
pub async fn load_svg_icon(library: &str, name: &str, path: &Path) -> io::Result<Icon> {
    let content = tokio::fs::read_to_string(path).await?;
    let tags = tags_from_name(name);
    let categories = categorize(name, &tags);

    let mut icon = Icon::new(name, library, path.to_string_lossy(), content)
        .with_tags(tags)
        .with_categories(categories);
    icon.size = svg_dimensions(&icon.content);
    icon.updated_at = modified_timestamp(path).await;
    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tags_from_name() {
        let tags = tags_from_name("Home-Fill");
        assert_eq!(tags[0], "home-fill");
        assert!(tags.contains(&"home".to_string()));
        assert!(tags.contains(&"fill".to_string()));
        assert!(tags.contains(&"house".to_string()));

        let tags = tags_from_name("arrow-left-16");
        assert!(!tags.contains(&"16".to_string()));
    }

    #[test]
    fn test_categorize() {
        let tags = tags_from_name("trash-2");
        assert_eq!(categorize("trash-2", &tags), vec!["actions"]);
        assert_eq!(categorize("zzz", &[]), vec![UNCATEGORIZED]);

        let categories = categorize("arrow-left", &tags_from_name("arrow-left"));
        assert!(categories.contains(&"arrows".to_string()));
    }

    #[test]
    fn test_svg_dimensions() {
        assert_eq!(
            svg_dimensions(r#"<svg xmlns="x" width="16" height="16" viewBox="0 0 16 16">"#),
            Some("16x16".to_string())
        );
        assert_eq!(
            svg_dimensions(r#"<svg viewBox="0 0 24 24" fill="none">"#),
            Some("24x24".to_string())
        );
        assert_eq!(svg_dimensions("<svg>"), None);
    }

    #[tokio::test]
    async fn test_scan_and_load() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("nested");
        std::fs::create_dir_all(&nested)?;
        std::fs::write(temp_dir.path().join("home.svg"), r#"<svg viewBox="0 0 24 24"></svg>"#)?;
        std::fs::write(nested.join("star.svg"), "<svg></svg>")?;
        std::fs::write(temp_dir.path().join("README.md"), "not an icon")?;

        let files = scan_svg_files(temp_dir.path()).await?;
        assert_eq!(files.len(), 2);

        let home = temp_dir.path().join("home.svg");
        let icon = load_svg_icon("test", "home", &home).await?;
        assert!(icon.is_valid());
        assert_eq!(icon.size.as_deref(), Some("24x24"));
        assert!(icon.tags.contains(&"house".to_string()));
        assert!(icon.updated_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        assert!(scan_svg_files(Path::new("/definitely/not/here")).await.is_err());
    }

    #[tokio::test]
    async fn test_read_package_version() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert_eq!(read_package_version(temp_dir.path()).await, None);

        std::fs::write(temp_dir.path().join("package.json"), r#"{"version":"19.8.0"}"#)?;
        assert_eq!(
            read_package_version(temp_dir.path()).await.as_deref(),
            Some("19.8.0")
        );
        Ok(())
    }
}
