//! Module pipeline contract shared by the loader and bundler hosts.

use std::path::PathBuf;

use async_trait::async_trait;
use orbit_compiler::{CompileError, CompiledCss, RuntimeMode};

use crate::integrations::IntegrationError;

/// Bundler configuration as seen by plugins once it is final.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub mode: RuntimeMode,

    /// Root the bundler resolves modules against
    pub root: PathBuf,
}

/// Source returned from a `load` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub code: String,
    pub map: Option<String>,
}

impl ModuleSource {
    /// Module source without a source map.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

impl From<CompiledCss> for ModuleSource {
    fn from(css: CompiledCss) -> Self {
        Self {
            code: css.code,
            map: css.map,
        }
    }
}

/// Errors raised by `load` hooks.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// A plugin in the bundler's resolve → load pipeline.
///
/// Hooks return `None` to decline, leaving the id to later plugins or the
/// bundler's default behavior.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin identifier
    fn name(&self) -> &'static str;

    /// Called once the bundler configuration is final.
    fn config_resolved(&self, _config: &ResolvedConfig) {}

    /// Claim a module id before default resolution.
    async fn resolve_id(&self, _id: &str) -> Option<String> {
        None
    }

    /// Provide the source of a resolved module id.
    async fn load(&self, _id: &str) -> Result<Option<ModuleSource>, LoadError> {
        Ok(None)
    }
}
