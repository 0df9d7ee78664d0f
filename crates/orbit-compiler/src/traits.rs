//! Trait definitions for component compilers.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Runtime mode of a build or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Development => f.write_str("development"),
            RuntimeMode::Production => f.write_str("production"),
        }
    }
}

/// Options forwarded to the compiler for every file.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Absolute project root
    pub project_root: PathBuf,

    /// Configured renderer integration package names, in order
    pub renderers: Vec<String>,

    /// Mode the owning build runs in
    pub mode: RuntimeMode,
}

/// A single compile invocation.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub compile_options: &'a CompileOptions,

    /// Path of the file being compiled
    pub filename: &'a Path,

    pub project_root: &'a Path,
}

/// Stylesheet extracted from a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCss {
    /// Stylesheet source
    pub code: String,

    /// Serialized source map, if the compiler produced one
    pub map: Option<String>,
}

/// Result of compiling one file.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Executable module source
    pub contents: String,

    /// Extracted stylesheet
    pub css: Option<CompiledCss>,
}

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Unsupported source file: {0}")]
    UnsupportedFile(String),

    #[error("Invalid frontmatter in {path}: {message}")]
    Frontmatter { path: String, message: String },

    #[error("Template error in {path}: {message}")]
    Template { path: String, message: String },

    #[error("Invalid stylesheet in {path}: {message}")]
    Style { path: String, message: String },

    #[error("Failed to emit module for {path}: {message}")]
    Module { path: String, message: String },
}

/// Trait for compilers of component-format and markup-format files.
#[async_trait]
pub trait ComponentCompiler: Send + Sync {
    /// Compiler identifier (e.g., "orbit")
    fn name(&self) -> &'static str;

    /// Compile `source` into a module.
    ///
    /// # Arguments
    /// * `source` - The file contents
    /// * `request` - Filename, project root and forwarded compile options
    async fn compile(
        &self,
        source: &str,
        request: &CompileRequest<'_>,
    ) -> Result<CompileResult, CompileError>;
}
