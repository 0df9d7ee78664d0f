//! Server-side rendering of a single route.

use std::path::Path;

use async_trait::async_trait;
use orbit_compiler::{parse_module, RuntimeMode};
use orbit_loader::module_id::is_style_id;
use orbit_loader::slash;
use url::Url;

use crate::bundler::{BundlerError, DevServer};
use crate::config::BuildConfig;
use crate::routes::{canonical_path, entry_id, RouteMap};
use crate::templates::{Context, TemplateEngine};

/// Everything a renderer needs to produce one page.
pub struct RenderRequest<'a> {
    pub config: &'a BuildConfig,
    pub mode: RuntimeMode,

    /// Route path being rendered, e.g. `/blog/index.html`
    pub req_url: &'a str,

    /// Canonical origin, e.g. `https://example.com`
    pub origin: &'a str,

    pub url_map: &'a RouteMap,
    pub server: &'a dyn DevServer,
}

/// Errors raised while rendering a route.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("No page for {0}")]
    NotFound(String),

    #[error(transparent)]
    Bundler(#[from] BundlerError),

    #[error("Module not found: {id}")]
    ModuleNotFound { id: String },

    #[error("{id} is not a renderable page module")]
    InvalidModule { id: String },

    #[error("Invalid canonical URL for {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to render template: {0}")]
    Template(String),
}

/// Renders a route to a complete HTML document.
#[async_trait]
pub trait ServerRenderer: Send + Sync {
    async fn render(&self, request: RenderRequest<'_>) -> Result<String, RenderError>;
}

/// Renders pages compiled by the built-in compiler.
///
/// The page module is loaded through the server, so the loader plugin runs
/// exactly as it would for the bundler. Stylesheets the module imports are
/// loaded the same way and inlined into the document head.
#[derive(Default)]
pub struct StaticRenderer {
    templates: TemplateEngine,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    async fn load(&self, server: &dyn DevServer, id: &str) -> Result<String, RenderError> {
        server
            .load_module(id)
            .await?
            .map(|module| module.code)
            .ok_or_else(|| RenderError::ModuleNotFound { id: id.to_string() })
    }
}

#[async_trait]
impl ServerRenderer for StaticRenderer {
    async fn render(&self, request: RenderRequest<'_>) -> Result<String, RenderError> {
        let route = request
            .url_map
            .resolve(request.req_url)
            .ok_or_else(|| RenderError::NotFound(request.req_url.to_string()))?;

        let code = self.load(request.server, &route.source_id).await?;
        let module = parse_module(&code).ok_or_else(|| RenderError::InvalidModule {
            id: route.source_id.clone(),
        })?;

        let page_dir = Path::new(&route.source_id).parent().unwrap_or(Path::new("/"));
        let mut styles = Vec::new();
        for import in &module.imports {
            let id = if is_style_id(import) {
                import.clone()
            } else if import.ends_with(".css") {
                slash(&page_dir.join(import))
            } else {
                continue;
            };
            styles.push(self.load(request.server, &id).await?);
        }

        let canonical_url = Url::parse(request.origin)
            .and_then(|origin| origin.join(canonical_path(request.req_url)))
            .map_err(|e| RenderError::InvalidUrl {
                url: request.req_url.to_string(),
                message: e.to_string(),
            })?;

        let title = module
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| entry_id(request.req_url));

        tracing::debug!("Rendered {} ({} mode)", request.req_url, request.mode);

        self.templates
            .render_page(&Context {
                title,
                canonical_url: canonical_url.to_string(),
                content: module.html,
                styles,
            })
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}
