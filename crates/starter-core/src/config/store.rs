//! Persisted answers for a generated project

use super::layers::{Config, PartialConfig};
use crate::error::{Result, StarterError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// The answers file kept in the project root (`.<generator>.yaml`)
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store for `generator` inside `project_dir`
    pub fn new(project_dir: &Path, generator: &str) -> Self {
        Self {
            path: project_dir.join(format!(".{}.yaml", generator)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved answers; a missing file is an empty layer
    pub async fn load(&self) -> Result<PartialConfig> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PartialConfig::default())
            }
            Err(e) => return Err(StarterError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(PartialConfig::default());
        }

        serde_yaml::from_str(&content).map_err(|source| StarterError::ConfigParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the saved answers with `config`
    pub async fn save(&self, config: &Config) -> Result<()> {
        let content = serde_yaml::to_string(config).map_err(|source| StarterError::ConfigWrite {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StarterError::io(parent, e))?;
        }

        fs::write(&self.path, content)
            .await
            .map_err(|e| StarterError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "saved generator config");
        Ok(())
    }
}
