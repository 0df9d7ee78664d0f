//! Built-in bundler: runs the plugin pipeline in process and emits entries.
//!
//! This host does not build a dependency graph. `load_module` runs
//! `resolve_id` then `load` across the configured plugins and falls back to
//! reading the file. `build` copies each entry's HTML into the output
//! directory, minifying inline styles, and copies the public directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use orbit_compiler::RuntimeMode;
use orbit_loader::{ModuleSource, ResolvedConfig};
use walkdir::WalkDir;

use crate::assets::AssetPipeline;
use crate::bundler::{Bundler, BundlerError, DevServer, ProductionBuild, ServerConfig};

/// In-process server over a plugin pipeline.
pub struct PluginHost {
    config: ServerConfig,
}

impl PluginHost {
    /// Create a host and notify every plugin of the resolved configuration.
    pub fn new(config: ServerConfig) -> Self {
        notify_plugins(&config, config.mode, &config.root);
        Self { config }
    }

    /// Default resolution: relative ids are resolved against the root.
    fn resolve_path(&self, id: &str) -> PathBuf {
        let path = Path::new(id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.root.join(path)
        }
    }
}

#[async_trait]
impl DevServer for PluginHost {
    fn config(&self) -> &ServerConfig {
        &self.config
    }

    async fn load_module(&self, id: &str) -> Result<Option<ModuleSource>, BundlerError> {
        let mut resolved = None;
        for plugin in &self.config.plugins {
            if let Some(claimed) = plugin.resolve_id(id).await {
                resolved = Some(claimed);
                break;
            }
        }
        let id = match resolved {
            Some(claimed) => claimed,
            None => self.resolve_path(id).to_string_lossy().into_owned(),
        };

        for plugin in &self.config.plugins {
            if let Some(source) = plugin.load(&id).await? {
                return Ok(Some(source));
            }
        }

        match tokio::fs::read_to_string(&id).await {
            Ok(code) => Ok(Some(ModuleSource::code(code))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BundlerError::Io {
                path: id,
                source: e,
            }),
        }
    }
}

/// Bundler backed by [`PluginHost`].
#[derive(Debug, Default)]
pub struct HostBundler;

impl HostBundler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Bundler for HostBundler {
    async fn create_server(&self, config: ServerConfig) -> Result<Arc<dyn DevServer>, BundlerError> {
        Ok(Arc::new(PluginHost::new(config)))
    }

    async fn build(&self, build: ProductionBuild) -> Result<(), BundlerError> {
        if build.watch {
            return Err(BundlerError::Unsupported("watch".to_string()));
        }
        notify_plugins(&build.server, RuntimeMode::Production, &build.root);

        if build.empty_out_dir {
            remove_dir_if_exists(&build.out_dir).await?;
        }
        create_dir(&build.out_dir).await?;

        for (id, path) in build.input.iter() {
            let html = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| io_error(path, e))?;

            let html = if build.minify {
                AssetPipeline::minify_inline_styles(&html)
            } else {
                html
            };

            let relative = path
                .strip_prefix(&build.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(format!("{id}.html")));
            let output = build.out_dir.join(relative);

            if let Some(parent) = output.parent() {
                create_dir(parent).await?;
            }
            tokio::fs::write(&output, html)
                .await
                .map_err(|e| io_error(&output, e))?;

            tracing::debug!("Emitted entry {} -> {}", id, output.display());
        }

        copy_public_dir(&build.server.public_dir, &build.out_dir).await
    }
}

fn notify_plugins(config: &ServerConfig, mode: RuntimeMode, root: &Path) {
    let resolved = ResolvedConfig {
        mode,
        root: root.to_path_buf(),
    };
    for plugin in &config.plugins {
        plugin.config_resolved(&resolved);
    }
}

/// Copy the public directory into the output directory verbatim.
async fn copy_public_dir(public_dir: &Path, out_dir: &Path) -> Result<(), BundlerError> {
    if !public_dir.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(public_dir).follow_links(true) {
        let entry = entry.map_err(|e| BundlerError::Io {
            path: public_dir.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(public_dir).unwrap_or(entry.path());
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            create_dir(parent).await?;
        }
        tokio::fs::copy(entry.path(), &target)
            .await
            .map_err(|e| io_error(&target, e))?;
    }

    Ok(())
}

async fn remove_dir_if_exists(dir: &Path) -> Result<(), BundlerError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(dir, e)),
    }
}

async fn create_dir(dir: &Path) -> Result<(), BundlerError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_error(dir, e))
}

fn io_error(path: &Path, source: std::io::Error) -> BundlerError {
    BundlerError::Io {
        path: path.display().to_string(),
        source,
    }
}
