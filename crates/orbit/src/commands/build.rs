//! Static site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use orbit_build::{BuildConfig, StaticBuilder};
use serde::Deserialize;

/// Configuration file structure (orbit.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    project: ProjectConfig,
    #[serde(default)]
    build: BuildSettings,
    #[serde(default)]
    dev: DevSettings,
    /// Renderer integration packages, in binding order
    #[serde(default)]
    renderers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectConfig {
    #[serde(default = "default_root")]
    root: String,
    #[serde(default = "default_pages")]
    pages: String,
    #[serde(default = "default_public")]
    public: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            pages: default_pages(),
            public: default_public(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildSettings {
    site: Option<String>,
    #[serde(default = "default_true")]
    sitemap: bool,
    #[serde(default = "default_true")]
    minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            site: None,
            sitemap: true,
            minify: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DevSettings {
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for DevSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}
fn default_pages() -> String {
    "src/pages".to_string()
}
fn default_public() -> String {
    "public".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_true() -> bool {
    true
}

/// Command-line values that take precedence over orbit.toml.
#[derive(Debug, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub site: Option<String>,
    pub minify: Option<bool>,
}

/// Load configuration from the config file if it exists.
/// Returns an error if the config file exists but is malformed.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

fn build_config(file: ConfigFile, overrides: Overrides) -> BuildConfig {
    BuildConfig {
        project_root: overrides
            .root
            .unwrap_or_else(|| PathBuf::from(&file.project.root)),
        pages_dir: PathBuf::from(&file.project.pages),
        public_dir: PathBuf::from(&file.project.public),
        site: overrides.site.or(file.build.site),
        port: file.dev.port,
        renderers: file.renderers,
        minify: overrides.minify.unwrap_or(file.build.minify),
        sitemap: file.build.sitemap,
    }
}

/// Run the build command.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building static site...");

    let config = build_config(load_config(config_path)?, overrides);
    let result = StaticBuilder::new(config).build().await?;

    tracing::info!(
        "Built {} pages ({} entries) in {}ms",
        result.pages,
        result.entries.len(),
        result.duration_ms
    );

    if result.collisions > 0 {
        tracing::warn!("{} entries were replaced by later routes", result.collisions);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
