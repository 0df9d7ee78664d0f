//! Renderer integrations and hydration entry synthesis.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;

/// A renderer integration package descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RendererIntegration {
    /// Package name, used as the import prefix
    pub name: String,

    /// Client entry, relative to the package (e.g. `./client.js`)
    pub client: String,

    /// Server entry, relative to the package
    pub server: String,
}

impl RendererIntegration {
    /// Import specifier of the client entry (`<name>/client.js`).
    pub fn client_entry(&self) -> String {
        let relative = self.client.strip_prefix('.').unwrap_or(&self.client);
        format!("{}{}", self.name, relative)
    }
}

/// Errors that can occur when loading an integration.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("Renderer '{name}' could not be loaded from {path}: {source}")]
    NotFound {
        name: String,
        path: String,
        source: std::io::Error,
    },

    #[error("Renderer '{name}' has an invalid descriptor: {message}")]
    Invalid { name: String, message: String },
}

/// Loads renderer integration descriptors by package name.
#[async_trait]
pub trait IntegrationResolver: Send + Sync {
    async fn import(&self, name: &str) -> Result<RendererIntegration, IntegrationError>;
}

/// Reads `node_modules/<name>/renderer.json` under the project root.
#[derive(Debug, Clone)]
pub struct PackageIntegrationResolver {
    project_root: PathBuf,
}

impl PackageIntegrationResolver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn descriptor_path(&self, name: &str) -> PathBuf {
        self.project_root
            .join("node_modules")
            .join(Path::new(name))
            .join("renderer.json")
    }
}

#[async_trait]
impl IntegrationResolver for PackageIntegrationResolver {
    async fn import(&self, name: &str) -> Result<RendererIntegration, IntegrationError> {
        let path = self.descriptor_path(name);

        let content =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| IntegrationError::NotFound {
                    name: name.to_string(),
                    path: path.display().to_string(),
                    source: e,
                })?;

        serde_json::from_str(&content).map_err(|e| IntegrationError::Invalid {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Resolve every named integration concurrently.
///
/// The result is in `names` order no matter which import settles first. Any
/// failure aborts the whole resolution.
pub async fn resolve_integrations(
    resolver: &dyn IntegrationResolver,
    names: &[String],
) -> Result<Vec<RendererIntegration>, IntegrationError> {
    try_join_all(names.iter().map(|name| resolver.import(name))).await
}

/// Generate the import bindings and `rendererInstances` table for the
/// hydration runtime. Binding `__renderer_{n}` is integration `n`.
pub fn hydration_prelude(integrations: &[RendererIntegration]) -> String {
    let mut code: Vec<String> = Vec::with_capacity(integrations.len() * 2 + 2);

    for (n, integration) in integrations.iter().enumerate() {
        code.push(format!(
            "import __renderer_{n} from '{}';",
            escape_string(&integration.client_entry())
        ));
    }

    code.push("const rendererInstances = [".to_string());
    for (n, integration) in integrations.iter().enumerate() {
        code.push(format!(
            "  {{ source: '{}', renderer: __renderer_{n}, polyfills: [], hydrationPolyfills: [] }},",
            escape_string(&integration.client_entry())
        ));
    }
    code.push("];".to_string());

    code.join("\n")
}

/// Escape a string for a single-quoted JavaScript literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}
