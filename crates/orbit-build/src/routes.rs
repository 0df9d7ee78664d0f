//! Page discovery and route mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use orbit_compiler::SourceKind;
use orbit_loader::slash;
use walkdir::WalkDir;

use crate::builder::BuildError;

/// A page source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// Absolute source path
    pub path: PathBuf,

    /// Path relative to the pages directory
    pub relative: PathBuf,
}

/// What a URL renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Module id of the page source
    pub source_id: String,

    /// Whether the page is pre-rendered by the static build
    pub is_static: bool,
}

/// URL path → page mapping, including extensionless aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMap {
    routes: BTreeMap<String, RouteEntry>,
}

impl RouteMap {
    /// Look up a request URL, canonical or alias.
    pub fn resolve(&self, url: &str) -> Option<&RouteEntry> {
        self.routes.get(url)
    }

    /// All routes, aliases included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Routes the static build materializes: static pages with an `.html` path.
    pub fn static_routes(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.iter()
            .filter(|(url, entry)| entry.is_static && is_html_route(url))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Entry id → intermediate HTML file, the bundler's multi-entry input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryTable {
    entries: BTreeMap<String, PathBuf>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Returns the path it replaced, if any.
    pub fn insert(&mut self, id: impl Into<String>, path: PathBuf) -> Option<PathBuf> {
        self.entries.insert(id.into(), path)
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a route path names an HTML file.
pub fn is_html_route(url: &str) -> bool {
    url.ends_with(".html")
}

/// Entry id for an HTML route: `index` for the root, otherwise the path
/// without its leading slash and trailing `/index.html` or `.html`.
pub fn entry_id(url: &str) -> String {
    if url == "/index.html" {
        return "index".to_string();
    }

    let path = url.trim_start_matches('/');
    path.strip_suffix("/index.html")
        .or_else(|| path.strip_suffix(".html"))
        .unwrap_or(path)
        .to_string()
}

/// Public URL of an HTML route: index files are served as their directory.
pub fn canonical_path(url: &str) -> &str {
    match url.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => dir,
        _ => url,
    }
}

/// Find all page sources under the pages directory, sorted by path.
pub fn scan_pages(pages_dir: &Path) -> Result<Vec<PageSource>, BuildError> {
    if !pages_dir.exists() {
        return Err(BuildError::PagesNotFound(pages_dir.display().to_string()));
    }

    let mut pages = Vec::new();

    for entry in WalkDir::new(pages_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::ReadError(e.to_string()))?;
        let path = entry.path();

        if !entry.file_type().is_file() || SourceKind::from_path(path).is_none() {
            continue;
        }

        let relative = path.strip_prefix(pages_dir).unwrap_or(path).to_path_buf();

        pages.push(PageSource {
            path: path.to_path_buf(),
            relative,
        });
    }

    Ok(pages)
}

/// Map page sources to URLs.
///
/// `index.orbit` → `/index.html` (+ `/`), `blog/index.md` → `/blog/index.html`
/// (+ `/blog/`, `/blog`), `about.orbit` → `/about.html` (+ `/about/`, `/about`).
/// Pages whose name starts with `$` are collections and are not static.
pub fn build_url_map(pages: &[PageSource]) -> RouteMap {
    let mut routes: BTreeMap<String, RouteEntry> = BTreeMap::new();

    for page in pages {
        let Some(stem) = page.relative.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("Skipping page with a non UTF-8 name: {}", page.path.display());
            continue;
        };
        let parent = page.relative.parent().map(slash).unwrap_or_default();
        let route = if parent.is_empty() {
            stem.to_string()
        } else {
            format!("{parent}/{stem}")
        };

        let entry = RouteEntry {
            source_id: slash(&page.path),
            is_static: !stem.starts_with('$'),
        };

        let (canonical, aliases) = if route == "index" {
            ("/index.html".to_string(), vec!["/".to_string()])
        } else if let Some(dir) = route.strip_suffix("/index") {
            (
                format!("/{dir}/index.html"),
                vec![format!("/{dir}/"), format!("/{dir}")],
            )
        } else {
            (
                format!("/{route}.html"),
                vec![format!("/{route}/"), format!("/{route}")],
            )
        };

        for alias in aliases {
            routes.entry(alias).or_insert_with(|| entry.clone());
        }
        routes.insert(canonical, entry);
    }

    RouteMap { routes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn page(relative: &str) -> PageSource {
        PageSource {
            path: PathBuf::from("/site/src/pages").join(relative),
            relative: PathBuf::from(relative),
        }
    }

    fn keys(map: &RouteMap) -> Vec<&str> {
        map.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn maps_root_index() {
        let map = build_url_map(&[page("index.orbit")]);

        assert_eq!(keys(&map), vec!["/", "/index.html"]);
        assert_eq!(
            map.resolve("/").unwrap().source_id,
            "/site/src/pages/index.orbit"
        );
    }

    #[test]
    fn maps_named_pages_with_aliases() {
        let map = build_url_map(&[page("about.md")]);

        assert_eq!(keys(&map), vec!["/about", "/about.html", "/about/"]);
    }

    #[test]
    fn maps_nested_index() {
        let map = build_url_map(&[page("blog/index.md"), page("blog/first-post.orbit")]);

        assert!(map.resolve("/blog/index.html").is_some());
        assert!(map.resolve("/blog/").is_some());
        assert!(map.resolve("/blog/first-post.html").is_some());
    }

    #[test]
    fn static_routes_skip_aliases_and_collections() {
        let map = build_url_map(&[
            page("index.orbit"),
            page("about.orbit"),
            page("$posts.orbit"),
        ]);

        let urls: Vec<&str> = map.static_routes().map(|(url, _)| url).collect();

        assert_eq!(urls, vec!["/about.html", "/index.html"]);
        assert!(!map.resolve("/$posts.html").unwrap().is_static);
    }

    #[cfg(unix)]
    #[test]
    fn skips_pages_with_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"\xffnotes.md");
        let odd = PageSource {
            path: PathBuf::from("/site/src/pages").join(name),
            relative: PathBuf::from(name),
        };

        let map = build_url_map(&[page("index.orbit"), odd]);

        assert_eq!(keys(&map), vec!["/", "/index.html"]);
        assert_eq!(
            map.resolve("/index.html").unwrap().source_id,
            "/site/src/pages/index.orbit"
        );
    }

    #[test]
    fn derives_entry_ids() {
        assert_eq!(entry_id("/index.html"), "index");
        assert_eq!(entry_id("/about.html"), "about");
        assert_eq!(entry_id("/blog/index.html"), "blog");
        assert_eq!(entry_id("/blog/first-post.html"), "blog/first-post");
    }

    #[test]
    fn colliding_routes_share_an_entry_id() {
        assert_eq!(entry_id("/a/index.html"), entry_id("/a.html"));
    }

    #[test]
    fn canonical_paths_drop_index() {
        assert_eq!(canonical_path("/index.html"), "/");
        assert_eq!(canonical_path("/blog/index.html"), "/blog/");
        assert_eq!(canonical_path("/about.html"), "/about.html");
        assert_eq!(canonical_path("/reindex.html"), "/reindex.html");
    }

    #[test]
    fn entry_table_last_write_wins() {
        let mut table = EntryTable::new();
        table.insert("a", PathBuf::from("/cache/a.html"));
        let replaced = table.insert("a", PathBuf::from("/cache/a/index.html"));

        assert_eq!(replaced, Some(PathBuf::from("/cache/a.html")));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a"), Some(Path::new("/cache/a/index.html")));
    }

    #[test]
    fn scans_page_files() {
        let temp = tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(pages.join("blog")).unwrap();
        fs::write(pages.join("index.orbit"), "<h1>Home</h1>").unwrap();
        fs::write(pages.join("blog/post.md"), "# Post").unwrap();
        fs::write(pages.join("notes.txt"), "ignored").unwrap();

        let found = scan_pages(&pages).unwrap();
        let relative: Vec<PathBuf> = found.into_iter().map(|p| p.relative).collect();

        assert_eq!(
            relative,
            vec![PathBuf::from("blog/post.md"), PathBuf::from("index.orbit")]
        );
    }

    #[test]
    fn errors_on_missing_pages_dir() {
        let temp = tempdir().unwrap();

        let result = scan_pages(&temp.path().join("missing"));

        assert!(matches!(result, Err(BuildError::PagesNotFound(_))));
    }
}
