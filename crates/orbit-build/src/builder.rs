//! Static site builder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use orbit_compiler::{CompileOptions, ComponentCompiler, OrbitCompiler, RuntimeMode};
use orbit_loader::{
    cache_dir, slash, ComponentLoader, IntegrationResolver, PackageIntegrationResolver, Plugin,
    StyleCache,
};
use quick_xml::escape::escape;

use crate::bundler::{
    Bundler, BundlerError, LogLevel, OptimizeDeps, OutputFormat, ProductionBuild, ServerConfig,
    ServerOptions, SsrOptions,
};
use crate::config::{canonical_origin, BuildConfig};
use crate::deps::{DependencyClassifier, PackageJsonClassifier};
use crate::host::HostBundler;
use crate::modules::{
    to_strings, BUILD_TARGET, CJS_MODULES, DEDUPE, ES_MODULES, OPTIMIZE_ENTRIES, RUNTIME_DEPS,
};
use crate::render::{RenderError, RenderRequest, ServerRenderer, StaticRenderer};
use crate::routes::{build_url_map, canonical_path, entry_id, scan_pages, EntryTable};

/// Output directory name, relative to the project root.
pub const OUTPUT_DIR: &str = "dist";

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages rendered
    pub pages: usize,

    /// Entry table handed to the bundler
    pub entries: EntryTable,

    /// Entries that replaced an earlier entry with the same id
    pub collisions: usize,

    /// Canonical origin pages were rendered against
    pub origin: String,

    /// Non-fatal problems
    pub warnings: Vec<String>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Pages directory not found: {0}")]
    PagesNotFound(String),

    #[error("Failed to read pages directory: {0}")]
    ReadError(String),

    #[error("Invalid site URL {site:?}: {message}")]
    InvalidSite { site: String, message: String },

    #[error(transparent)]
    Bundler(#[from] BundlerError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Static site builder.
///
/// Renders every static route through a bundler server running the
/// [`ComponentLoader`], writes the HTML into the cache directory and hands the
/// resulting entry table to the bundler's production build.
pub struct StaticBuilder {
    config: BuildConfig,
    compiler: Arc<dyn ComponentCompiler>,
    integrations: Option<Arc<dyn IntegrationResolver>>,
    bundler: Arc<dyn Bundler>,
    renderer: Arc<dyn ServerRenderer>,
    classifier: Arc<dyn DependencyClassifier>,
}

impl StaticBuilder {
    /// Create a builder with the built-in collaborators.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            compiler: Arc::new(OrbitCompiler::new()),
            integrations: None,
            bundler: Arc::new(HostBundler::new()),
            renderer: Arc::new(StaticRenderer::new()),
            classifier: Arc::new(PackageJsonClassifier),
        }
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ComponentCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Use a custom integration resolver instead of reading `node_modules`.
    pub fn with_integrations(mut self, integrations: Arc<dyn IntegrationResolver>) -> Self {
        self.integrations = Some(integrations);
        self
    }

    pub fn with_bundler(mut self, bundler: Arc<dyn Bundler>) -> Self {
        self.bundler = bundler;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ServerRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DependencyClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let root = std::path::absolute(&self.config.project_root)
            .map_err(|e| io_error(&self.config.project_root, e))?;
        let pages = scan_pages(&root.join(&self.config.pages_dir))?;
        let url_map = build_url_map(&pages);
        tracing::info!("Found {} pages ({} routes)", pages.len(), url_map.len());

        let origin = canonical_origin(&self.config)?;
        let mut warnings = Vec::new();
        if let Some(warning) = &origin.warning {
            tracing::warn!("{}", warning);
            warnings.push(warning.clone());
        }

        let cache = cache_dir(&root);
        let server_config = self.server_config(&root).await?;

        let (server, ()) = tokio::try_join!(
            async {
                self.bundler
                    .create_server(server_config)
                    .await
                    .map_err(BuildError::from)
            },
            remove_cache_dir(&cache),
        )?;

        // Render every static route
        let (url_map, cache, origin_url) = (&url_map, &cache, origin.url.as_str());
        let server = server.as_ref();
        let renders = url_map.static_routes().map(|(url, _)| async move {
            let html = self
                .renderer
                .render(RenderRequest {
                    config: &self.config,
                    mode: RuntimeMode::Production,
                    req_url: url,
                    origin: origin_url,
                    url_map,
                    server,
                })
                .await?;

            let path = cache.join(url.trim_start_matches('/'));
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(parent, e))?;
            }
            tokio::fs::write(&path, html)
                .await
                .map_err(|e| io_error(&path, e))?;

            tracing::debug!("Rendered {} -> {}", url, path.display());

            Ok::<_, BuildError>((entry_id(url), path))
        });
        let rendered = try_join_all(renders).await?;
        let page_count = rendered.len();

        let mut entries = EntryTable::new();
        let mut collisions = 0;
        for (id, path) in rendered {
            if let Some(previous) = entries.insert(id.clone(), path.clone()) {
                collisions += 1;
                tracing::warn!(
                    "Entry \"{}\" from {} replaces {}",
                    id,
                    path.display(),
                    previous.display()
                );
            }
        }

        let output_dir = root.join(OUTPUT_DIR);
        tracing::info!("Bundling {} entries into {}", entries.len(), output_dir.display());

        self.bundler
            .build(ProductionBuild {
                root: cache.clone(),
                out_dir: output_dir.clone(),
                empty_out_dir: true,
                input: entries.clone(),
                format: OutputFormat::Esm,
                minify: self.config.minify,
                target: BUILD_TARGET.to_string(),
                watch: false,
                server: server.config().clone(),
            })
            .await?;

        if self.config.site.is_some() && self.config.sitemap {
            generate_sitemap(&output_dir, origin_url, cache, &entries).await?;
        }

        let duration = start.elapsed();

        Ok(BuildResult {
            pages: page_count,
            entries,
            collisions,
            origin: origin.url.clone(),
            warnings,
            duration_ms: duration.as_millis() as u64,
            output_dir,
        })
    }

    /// Server configuration shared by the render server and the production build.
    async fn server_config(&self, root: &Path) -> Result<ServerConfig, BuildError> {
        let integrations = self
            .integrations
            .clone()
            .unwrap_or_else(|| Arc::new(PackageIntegrationResolver::new(root)));

        let loader: Arc<dyn Plugin> = Arc::new(ComponentLoader::new(
            CompileOptions {
                project_root: root.to_path_buf(),
                renderers: self.config.renderers.clone(),
                mode: RuntimeMode::Production,
            },
            self.compiler.clone(),
            integrations,
            StyleCache::new(),
        ));

        let mut no_external = to_strings(ES_MODULES);
        no_external.extend(self.classifier.user_deps(root).await?);

        Ok(ServerConfig {
            mode: RuntimeMode::Production,
            root: root.to_path_buf(),
            public_dir: root.join(&self.config.public_dir),
            plugins: vec![loader],
            dedupe: to_strings(DEDUPE),
            server: ServerOptions {
                fs_strict: false,
                hmr_overlay: false,
                middleware: true,
            },
            optimize_deps: OptimizeDeps {
                entries: to_strings(OPTIMIZE_ENTRIES),
                include: to_strings(RUNTIME_DEPS),
            },
            ssr: SsrOptions {
                external: to_strings(CJS_MODULES),
                no_external,
            },
            log_level: LogLevel::Error,
        })
    }
}

async fn remove_cache_dir(cache: &Path) -> Result<(), BuildError> {
    match tokio::fs::remove_dir_all(cache).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(cache, e)),
    }
}

/// Write `sitemap.xml` listing every emitted entry, plus a `robots.txt`
/// pointing at it unless the public directory already provided one.
async fn generate_sitemap(
    output_dir: &Path,
    origin: &str,
    cache: &Path,
    entries: &EntryTable,
) -> Result<(), BuildError> {
    let urls: Vec<String> = entries
        .iter()
        .map(|(_, path)| {
            let route = format!("/{}", slash(path.strip_prefix(cache).unwrap_or(path)));
            let loc = format!("{}{}", origin, canonical_path(&route));
            format!("  <url>\n    <loc>{}</loc>\n  </url>", escape(loc.as_str()))
        })
        .collect();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>"#,
        urls.join("\n")
    );

    let sitemap_path = output_dir.join("sitemap.xml");
    tokio::fs::write(&sitemap_path, sitemap)
        .await
        .map_err(|e| io_error(&sitemap_path, e))?;

    let robots_path = output_dir.join("robots.txt");
    if !robots_path.exists() {
        let robots = format!("User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml", origin);
        tokio::fs::write(&robots_path, robots)
            .await
            .map_err(|e| io_error(&robots_path, e))?;
    }

    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.display().to_string(),
        source,
    }
}
