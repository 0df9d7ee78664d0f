//! Static build pipeline for Orbit sites.
//!
//! Maps pages to routes, renders every static route through a bundler server
//! running the Orbit loader plugin, and hands the rendered HTML to the
//! bundler's production pass.

pub mod assets;
pub mod builder;
pub mod bundler;
pub mod config;
pub mod deps;
pub mod host;
pub mod modules;
pub mod render;
pub mod routes;
pub mod templates;

pub use builder::{BuildError, BuildResult, StaticBuilder};
pub use bundler::{
    Bundler, BundlerError, DevServer, LogLevel, OptimizeDeps, OutputFormat, ProductionBuild,
    ServerConfig, ServerOptions, SsrOptions,
};
pub use config::{canonical_origin, BuildConfig, Origin};
pub use deps::{DependencyClassifier, PackageJsonClassifier};
pub use host::{HostBundler, PluginHost};
pub use render::{RenderError, RenderRequest, ServerRenderer, StaticRenderer};
pub use routes::{build_url_map, entry_id, scan_pages, EntryTable, PageSource, RouteEntry, RouteMap};
