//! Build configuration and canonical origin resolution.

use std::path::PathBuf;

use url::Url;

use crate::builder::BuildError;

/// Warning emitted when no site URL is configured.
pub const MISSING_SITE_WARNING: &str =
    "Set \"site\" in [build] to generate correct canonical URLs and sitemap";

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root
    pub project_root: PathBuf,

    /// Pages directory, relative to the project root
    pub pages_dir: PathBuf,

    /// Public (copied verbatim) directory, relative to the project root
    pub public_dir: PathBuf,

    /// Production site URL
    pub site: Option<String>,

    /// Development server port, used for the fallback origin
    pub port: u16,

    /// Renderer integration package names, in binding order
    pub renderers: Vec<String>,

    /// Minify output
    pub minify: bool,

    /// Write sitemap.xml and robots.txt when a site is configured
    pub sitemap: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            pages_dir: PathBuf::from("src/pages"),
            public_dir: PathBuf::from("public"),
            site: None,
            port: 3000,
            renderers: vec![],
            minify: true,
            sitemap: true,
        }
    }
}

/// Canonical site origin for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Scheme, host and port, without a trailing slash
    pub url: String,

    /// Set when the origin had to fall back to localhost
    pub warning: Option<String>,
}

/// Resolve the canonical origin: the configured site's origin, or
/// `http://localhost:<port>` with a warning.
pub fn canonical_origin(config: &BuildConfig) -> Result<Origin, BuildError> {
    let Some(site) = &config.site else {
        return Ok(Origin {
            url: format!("http://localhost:{}", config.port),
            warning: Some(MISSING_SITE_WARNING.to_string()),
        });
    };

    let parsed = Url::parse(site).map_err(|e| BuildError::InvalidSite {
        site: site.clone(),
        message: e.to_string(),
    })?;

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(BuildError::InvalidSite {
            site: site.clone(),
            message: "site must be an http(s) URL".to_string(),
        });
    }

    Ok(Origin {
        url: origin.ascii_serialization(),
        warning: None,
    })
}
