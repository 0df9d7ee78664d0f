//! Bundler loader plugin for Orbit components.
//!
//! Lets a generic module bundler load `.orbit` and `.md` files, serve
//! stylesheets extracted from them, and synthesize the hydration runtime entry
//! that wires in configured renderer integrations.

pub mod integrations;
pub mod loader;
pub mod module_id;
pub mod plugin;
pub mod style_cache;

use std::path::{Path, PathBuf};

pub use integrations::{
    hydration_prelude, resolve_integrations, IntegrationError, IntegrationResolver,
    PackageIntegrationResolver, RendererIntegration,
};
pub use loader::ComponentLoader;
pub use module_id::{ModuleRequest, HYDRATION_ENTRY_SUFFIX, STYLE_NAMESPACE};
pub use plugin::{LoadError, ModuleSource, Plugin, ResolvedConfig};
pub use style_cache::StyleCache;

/// Intermediate cache directory name, relative to the project root.
pub const CACHE_DIR: &str = ".orbit-cache";

/// Absolute intermediate cache directory for a project.
pub fn cache_dir(project_root: &Path) -> PathBuf {
    project_root.join(CACHE_DIR)
}

/// Render a path with forward slashes.
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
