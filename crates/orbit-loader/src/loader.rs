//! Component loader plugin.
//!
//! Implements [`Plugin`] with:
//! - `config_resolved` - pick up the bundler's runtime mode
//! - `resolve_id` - claim `orbit:css` ids
//! - `load` - synthesize the hydration entry, compile components, serve cached styles

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use orbit_compiler::{CompileOptions, CompileRequest, CompiledCss, ComponentCompiler, RuntimeMode};

use crate::integrations::{hydration_prelude, resolve_integrations, IntegrationResolver};
use crate::module_id::{is_style_id, style_id, ModuleRequest};
use crate::plugin::{LoadError, ModuleSource, Plugin, ResolvedConfig};
use crate::style_cache::StyleCache;
use crate::{cache_dir, slash};

/// The Orbit loader plugin.
///
/// In production mode extracted stylesheets are written under
/// `<cache>/css/` and imported by relative path. In development mode they are
/// kept in the [`StyleCache`] and imported through the `orbit:css` namespace.
pub struct ComponentLoader {
    options: CompileOptions,
    compiler: Arc<dyn ComponentCompiler>,
    integrations: Arc<dyn IntegrationResolver>,
    styles: StyleCache,
    style_dir: PathBuf,
    production: AtomicBool,
}

impl ComponentLoader {
    pub fn new(
        options: CompileOptions,
        compiler: Arc<dyn ComponentCompiler>,
        integrations: Arc<dyn IntegrationResolver>,
        styles: StyleCache,
    ) -> Self {
        let style_dir = cache_dir(&options.project_root).join("css");
        let production = options.mode == RuntimeMode::Production;

        Self {
            options,
            compiler,
            integrations,
            styles,
            style_dir,
            production: AtomicBool::new(production),
        }
    }

    /// Current runtime mode.
    pub fn mode(&self) -> RuntimeMode {
        if self.production.load(Ordering::Acquire) {
            RuntimeMode::Production
        } else {
            RuntimeMode::Development
        }
    }

    /// The style cache this loader writes to in development mode.
    pub fn style_cache(&self) -> StyleCache {
        self.styles.clone()
    }

    /// Style key for a component: its project-relative path plus `.css`.
    fn style_key(&self, id: &str) -> String {
        let path = Path::new(id);
        let relative = path
            .strip_prefix(&self.options.project_root)
            .map(slash)
            .unwrap_or_else(|_| slash(path));

        format!("/{}.css", relative.trim_start_matches('/'))
    }

    async fn load_hydration_entry(&self, id: &str) -> Result<ModuleSource, LoadError> {
        let integrations =
            resolve_integrations(self.integrations.as_ref(), &self.options.renderers).await?;

        let base = tokio::fs::read_to_string(id)
            .await
            .map_err(|e| LoadError::Read {
                path: id.to_string(),
                source: e,
            })?;

        tracing::debug!("Synthesized hydration entry with {} renderers", integrations.len());

        Ok(ModuleSource::code(format!(
            "{}\n{}",
            hydration_prelude(&integrations),
            base
        )))
    }

    async fn load_component(&self, id: &str) -> Result<ModuleSource, LoadError> {
        let source = tokio::fs::read_to_string(id)
            .await
            .map_err(|e| LoadError::Read {
                path: id.to_string(),
                source: e,
            })?;

        let request = CompileRequest {
            compile_options: &self.options,
            filename: Path::new(id),
            project_root: &self.options.project_root,
        };

        let result = self.compiler.compile(&source, &request).await?;
        let mut code = result.contents;

        if let Some(css) = result.css.filter(|css| !css.code.is_empty()) {
            let key = self.style_key(id);
            let import = match self.mode() {
                RuntimeMode::Production => self.emit_stylesheet(id, &key, &css).await?,
                RuntimeMode::Development => {
                    self.styles.insert(&key, css);
                    style_id(&key)
                }
            };

            if !code.is_empty() && !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&format!("import '{import}';\n"));
        }

        tracing::debug!("Compiled {}", id);

        Ok(ModuleSource::code(code))
    }

    /// Write a stylesheet under the cache's style directory and return the
    /// relative import path from the component's directory.
    async fn emit_stylesheet(
        &self,
        id: &str,
        key: &str,
        css: &CompiledCss,
    ) -> Result<String, LoadError> {
        let file_path = self.style_dir.join(key.trim_start_matches('/'));

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, e))?;
        }

        tokio::fs::write(&file_path, &css.code)
            .await
            .map_err(|e| write_error(&file_path, e))?;

        if let Some(map) = &css.map {
            let map_path = PathBuf::from(format!("{}.map", file_path.display()));
            tokio::fs::write(&map_path, map)
                .await
                .map_err(|e| write_error(&map_path, e))?;
        }

        let component_dir = Path::new(id).parent().unwrap_or(Path::new("/"));
        let relative_dir = pathdiff::diff_paths(&self.style_dir, component_dir)
            .map(|p| slash(&p))
            .unwrap_or_else(|| slash(&self.style_dir));

        let relative_dir = if relative_dir.starts_with('.') || relative_dir.starts_with('/') {
            relative_dir
        } else {
            format!("./{relative_dir}")
        };

        Ok(format!("{relative_dir}{key}"))
    }
}

fn write_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Write {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl Plugin for ComponentLoader {
    fn name(&self) -> &'static str {
        "orbit-loader"
    }

    fn config_resolved(&self, config: &ResolvedConfig) {
        self.production
            .store(config.mode == RuntimeMode::Production, Ordering::Release);
    }

    async fn resolve_id(&self, id: &str) -> Option<String> {
        is_style_id(id).then(|| id.to_string())
    }

    async fn load(&self, id: &str) -> Result<Option<ModuleSource>, LoadError> {
        match ModuleRequest::classify(id) {
            ModuleRequest::HydrationEntry => self.load_hydration_entry(id).await.map(Some),
            ModuleRequest::Component => self.load_component(id).await.map(Some),
            ModuleRequest::Style { key } => Ok(self
                .styles
                .get(&key.replace('\\', "/"))
                .map(ModuleSource::from)),
            ModuleRequest::Unhandled => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{IntegrationError, RendererIntegration};
    use orbit_compiler::{CompileError, CompileResult, OrbitCompiler};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Compiler that emits fixed output, optionally with a source map.
    struct FixedCompiler {
        css: Option<CompiledCss>,
        fail: bool,
    }

    #[async_trait]
    impl ComponentCompiler for FixedCompiler {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn compile(
            &self,
            _source: &str,
            request: &CompileRequest<'_>,
        ) -> Result<CompileResult, CompileError> {
            if self.fail {
                return Err(CompileError::Template {
                    path: request.filename.display().to_string(),
                    message: "unexpected token".to_string(),
                });
            }
            Ok(CompileResult {
                contents: "export default 1;".to_string(),
                css: self.css.clone(),
            })
        }
    }

    struct DelayedResolver {
        delays: HashMap<String, u64>,
        missing: Option<String>,
    }

    #[async_trait]
    impl IntegrationResolver for DelayedResolver {
        async fn import(&self, name: &str) -> Result<RendererIntegration, IntegrationError> {
            let delay = self.delays.get(name).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.missing.as_deref() == Some(name) {
                return Err(IntegrationError::Invalid {
                    name: name.to_string(),
                    message: "no default export".to_string(),
                });
            }
            Ok(RendererIntegration {
                name: name.to_string(),
                client: "./client.js".to_string(),
                server: "./server.js".to_string(),
            })
        }
    }

    fn no_renderers() -> Arc<dyn IntegrationResolver> {
        Arc::new(DelayedResolver {
            delays: HashMap::new(),
            missing: None,
        })
    }

    fn loader(
        root: &Path,
        mode: RuntimeMode,
        compiler: Arc<dyn ComponentCompiler>,
        integrations: Arc<dyn IntegrationResolver>,
        renderers: Vec<String>,
    ) -> ComponentLoader {
        ComponentLoader::new(
            CompileOptions {
                project_root: root.to_path_buf(),
                renderers,
                mode,
            },
            compiler,
            integrations,
            StyleCache::new(),
        )
    }

    fn write_component(root: &Path, rel: &str, source: &str) -> String {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, source).unwrap();
        path.display().to_string()
    }

    fn last_import(code: &str) -> String {
        let line = code.lines().rev().find(|l| l.starts_with("import ")).unwrap();
        line.trim_start_matches("import '")
            .trim_end_matches("';")
            .to_string()
    }

    #[tokio::test]
    async fn production_styles_are_written_to_disk() {
        let temp = tempdir().unwrap();
        let id = write_component(temp.path(), "pages/blog/index.orbit", "");
        let css = CompiledCss {
            code: "h1 {\n  color: red;\n}\n".to_string(),
            map: None,
        };
        let loader = loader(
            temp.path(),
            RuntimeMode::Production,
            Arc::new(FixedCompiler {
                css: Some(css.clone()),
                fail: false,
            }),
            no_renderers(),
            vec![],
        );

        let module = loader.load(&id).await.unwrap().unwrap();

        let import = last_import(&module.code);
        assert_eq!(import, "../../.orbit-cache/css/pages/blog/index.orbit.css");

        let target = temp.path().join("pages/blog").join(&import);
        assert_eq!(fs::read(target).unwrap(), css.code.as_bytes());
        assert!(!temp
            .path()
            .join(".orbit-cache/css/pages/blog/index.orbit.css.map")
            .exists());
        assert!(loader.style_cache().is_empty());
    }

    #[tokio::test]
    async fn production_writes_source_maps() {
        let temp = tempdir().unwrap();
        let id = write_component(temp.path(), "pages/index.orbit", "");
        let css = CompiledCss {
            code: "p{margin:0}".to_string(),
            map: Some(r#"{"version":3}"#.to_string()),
        };
        let loader = loader(
            temp.path(),
            RuntimeMode::Production,
            Arc::new(FixedCompiler {
                css: Some(css),
                fail: false,
            }),
            no_renderers(),
            vec![],
        );

        loader.load(&id).await.unwrap();

        let map = temp.path().join(".orbit-cache/css/pages/index.orbit.css.map");
        assert_eq!(fs::read_to_string(map).unwrap(), r#"{"version":3}"#);
    }

    #[tokio::test]
    async fn development_styles_round_trip_through_cache() {
        let temp = tempdir().unwrap();
        let id = write_component(temp.path(), "pages/index.orbit", "");
        let css = CompiledCss {
            code: "p{margin:0}".to_string(),
            map: Some("map".to_string()),
        };
        let loader = loader(
            temp.path(),
            RuntimeMode::Development,
            Arc::new(FixedCompiler {
                css: Some(css.clone()),
                fail: false,
            }),
            no_renderers(),
            vec![],
        );

        let module = loader.load(&id).await.unwrap().unwrap();
        let import = last_import(&module.code);
        assert_eq!(import, "orbit:css/pages/index.orbit.css");

        let resolved = loader.resolve_id(&import).await.unwrap();
        let style = loader.load(&resolved).await.unwrap().unwrap();

        assert_eq!(style, ModuleSource::from(css));
        assert!(!temp.path().join(".orbit-cache").exists());
    }

    #[tokio::test]
    async fn config_resolved_switches_mode() {
        let temp = tempdir().unwrap();
        let loader = loader(
            temp.path(),
            RuntimeMode::Development,
            Arc::new(OrbitCompiler::new()),
            no_renderers(),
            vec![],
        );

        loader.config_resolved(&ResolvedConfig {
            mode: RuntimeMode::Production,
            root: temp.path().to_path_buf(),
        });

        assert_eq!(loader.mode(), RuntimeMode::Production);
    }

    #[tokio::test]
    async fn unknown_style_id_declines() {
        let temp = tempdir().unwrap();
        let loader = loader(
            temp.path(),
            RuntimeMode::Development,
            Arc::new(OrbitCompiler::new()),
            no_renderers(),
            vec![],
        );

        assert!(loader.load("orbit:css/missing.css").await.unwrap().is_none());
        assert!(loader.load("/project/src/app.js").await.unwrap().is_none());
        assert!(loader.resolve_id("/project/src/app.js").await.is_none());
    }

    #[tokio::test]
    async fn compile_errors_propagate() {
        let temp = tempdir().unwrap();
        let id = write_component(temp.path(), "pages/index.orbit", "");
        let loader = loader(
            temp.path(),
            RuntimeMode::Production,
            Arc::new(FixedCompiler {
                css: None,
                fail: true,
            }),
            no_renderers(),
            vec![],
        );

        let result = loader.load(&id).await;

        assert!(matches!(result, Err(LoadError::Compile(CompileError::Template { .. }))));
    }

    #[tokio::test]
    async fn hydration_entry_orders_bindings_by_configuration() {
        let temp = tempdir().unwrap();
        let entry = write_component(
            temp.path(),
            "runtime/__orbit_component.js",
            "export const hydrate = 1;\n",
        );
        let names: Vec<String> = ["r0", "r1", "r2", "r3"].map(String::from).to_vec();
        // Reverse latency: the last renderer settles first
        let resolver = DelayedResolver {
            delays: HashMap::from([
                ("r0".to_string(), 80),
                ("r1".to_string(), 50),
                ("r2".to_string(), 20),
                ("r3".to_string(), 0),
            ]),
            missing: None,
        };
        let loader = loader(
            temp.path(),
            RuntimeMode::Production,
            Arc::new(OrbitCompiler::new()),
            Arc::new(resolver),
            names,
        );

        let module = loader.load(&entry).await.unwrap().unwrap();

        assert_eq!(module.code.matches("import __renderer_").count(), 4);
        assert_eq!(module.code.matches("hydrationPolyfills: []").count(), 4);
        for n in 0..4 {
            assert!(module
                .code
                .contains(&format!("import __renderer_{n} from 'r{n}/client.js';")));
            assert!(module
                .code
                .contains(&format!("source: 'r{n}/client.js', renderer: __renderer_{n},")));
        }
        assert!(module.code.ends_with("];\nexport const hydrate = 1;\n"));
    }

    #[tokio::test]
    async fn failed_renderer_import_aborts_synthesis() {
        let temp = tempdir().unwrap();
        let entry = write_component(temp.path(), "runtime/__orbit_component.js", "");
        let resolver = DelayedResolver {
            delays: HashMap::new(),
            missing: Some("broken".to_string()),
        };
        let loader = loader(
            temp.path(),
            RuntimeMode::Production,
            Arc::new(OrbitCompiler::new()),
            Arc::new(resolver),
            vec!["ok".to_string(), "broken".to_string()],
        );

        let result = loader.load(&entry).await;

        assert!(matches!(result, Err(LoadError::Integration(_))));
    }
}
