//! Contracts for the module bundler the build hands off to.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use orbit_compiler::RuntimeMode;
use orbit_loader::{LoadError, ModuleSource, Plugin};

use crate::routes::EntryTable;

/// Dependency pre-bundling hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeDeps {
    /// Globs scanned for dependencies
    pub entries: Vec<String>,

    /// Dependencies always pre-bundled
    pub include: Vec<String>,
}

/// Server-side module externalization rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsrOptions {
    /// Modules always left to the runtime loader
    pub external: Vec<String>,

    /// Modules always bundled inline
    pub no_external: Vec<String>,
}

/// In-process server behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Restrict filesystem access to the root
    pub fs_strict: bool,

    /// Show the HMR error overlay
    pub hmr_overlay: bool,

    /// Run as middleware for server-side rendering instead of listening
    pub middleware: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            fs_strict: true,
            hmr_overlay: true,
            middleware: false,
        }
    }
}

/// Minimum severity the bundler reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
}

/// Inline configuration for an in-process bundler server.
#[derive(Clone)]
pub struct ServerConfig {
    pub mode: RuntimeMode,
    pub root: PathBuf,
    pub public_dir: PathBuf,

    /// Pipeline plugins, tried in order
    pub plugins: Vec<Arc<dyn Plugin>>,

    /// Packages resolved to a single copy
    pub dedupe: Vec<String>,

    pub server: ServerOptions,
    pub optimize_deps: OptimizeDeps,
    pub ssr: SsrOptions,
    pub log_level: LogLevel,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();

        f.debug_struct("ServerConfig")
            .field("mode", &self.mode)
            .field("root", &self.root)
            .field("public_dir", &self.public_dir)
            .field("plugins", &plugins)
            .field("dedupe", &self.dedupe)
            .field("server", &self.server)
            .field("optimize_deps", &self.optimize_deps)
            .field("ssr", &self.ssr)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Esm,
}

/// One-shot production build request.
#[derive(Debug, Clone)]
pub struct ProductionBuild {
    /// Root the entries live under
    pub root: PathBuf,

    pub out_dir: PathBuf,

    /// Remove existing output before writing
    pub empty_out_dir: bool,

    /// Multi-entry input set
    pub input: EntryTable,

    pub format: OutputFormat,
    pub minify: bool,

    /// Syntax target, e.g. `es2020`
    pub target: String,

    pub watch: bool,

    /// Server configuration (plugins included) reused for the build
    pub server: ServerConfig,
}

/// Errors raised by bundler collaborators.
#[derive(Debug, thiserror::Error)]
pub enum BundlerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("Unsupported build option: {0}")]
    Unsupported(String),
}

/// An in-process server exposing the bundler's module pipeline.
#[async_trait]
pub trait DevServer: Send + Sync {
    /// Configuration the server was created with.
    fn config(&self) -> &ServerConfig;

    /// Resolve and load a module through the plugin pipeline.
    ///
    /// Returns `None` when nothing can provide the id.
    async fn load_module(&self, id: &str) -> Result<Option<ModuleSource>, BundlerError>;
}

/// A module bundler.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Create an in-process server from inline configuration.
    async fn create_server(&self, config: ServerConfig) -> Result<Arc<dyn DevServer>, BundlerError>;

    /// Run a production build.
    async fn build(&self, build: ProductionBuild) -> Result<(), BundlerError>;
}
