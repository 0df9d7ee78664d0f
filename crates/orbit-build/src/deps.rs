//! Project dependency classification.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::bundler::BundlerError;

/// Decides which project dependencies must be bundled inline.
#[async_trait]
pub trait DependencyClassifier: Send + Sync {
    async fn user_deps(&self, project_root: &Path) -> Result<Vec<String>, BundlerError>;
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

/// Treats every `dependencies` entry of `package.json` as needing inlining.
#[derive(Debug, Default)]
pub struct PackageJsonClassifier;

#[async_trait]
impl DependencyClassifier for PackageJsonClassifier {
    async fn user_deps(&self, project_root: &Path) -> Result<Vec<String>, BundlerError> {
        let path = project_root.join("package.json");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(BundlerError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|e| BundlerError::Manifest {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(manifest.dependencies.into_keys().collect())
    }
}
