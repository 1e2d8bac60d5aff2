//! Project context shared between generator modules
//!
//! The context is read from `web-starter.yaml` in the project root, handed to
//! the workflow by value, and written back once the run has finished. Sibling
//! generators declare services and deployment settings here; this generator
//! reads them and publishes its own values.

use crate::error::{Result, StarterError};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the project context in the project root
pub const PROJECT_FILE: &str = "web-starter.yaml";

/// A service declared by a sibling generator (web server, database, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,

    /// Web-servable root, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_root: Option<String>,
}

/// Settings owned by the deployment generator (Capistrano)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub config: Mapping,
}

impl DeploymentConfig {
    /// Set a key in the deployment config, replacing any previous value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.config.insert(Value::String(key.to_string()), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

/// Typed view of the values generators exchange within one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Project machine name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub services: Vec<ServiceDecl>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Present when the deployment generator is part of the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,

    /// Answers published by each generator, keyed by generator name
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_path: Option<String>,
}

impl ProjectContext {
    /// Empty context for a new project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_FILE)
    }

    /// Load the context of `project_dir`, or start a new one named `fallback_name`
    pub async fn load_or_new(project_dir: &Path, fallback_name: &str) -> Result<Self> {
        let path = Self::path(project_dir);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new(fallback_name))
            }
            Err(e) => return Err(StarterError::io(&path, e)),
        };

        let mut project: Self = serde_yaml::from_str(&content)
            .map_err(|source| StarterError::ConfigParse { path, source })?;
        if project.name.is_empty() {
            project.name = fallback_name.to_string();
        }
        Ok(project)
    }

    /// Write the context back to `project_dir`
    pub async fn save(&self, project_dir: &Path) -> Result<()> {
        let path = Self::path(project_dir);
        let content = serde_yaml::to_string(self).map_err(|source| StarterError::ConfigWrite {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(project_dir)
            .await
            .map_err(|e| StarterError::io(project_dir, e))?;
        fs::write(&path, content)
            .await
            .map_err(|e| StarterError::io(&path, e))
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDecl> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.service(name).is_some()
    }
}
