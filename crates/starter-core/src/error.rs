//! Error types for the generator workflow

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while generating a project
///
/// Every variant aborts the run. Files written before the failure are left
/// in place.
#[derive(Debug, Error)]
pub enum StarterError {
    #[error("Failed to fetch release metadata from {url}")]
    MetadataFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch release metadata from {url}: HTTP {status}")]
    MetadataStatus { url: String, status: u16 },

    #[error("Failed to parse release metadata from {url}")]
    MetadataParse {
        url: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No {major}.x releases available")]
    NoReleases { major: u64 },

    #[error("{0}")]
    Validation(String),

    #[error("Failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Invalid archive URL: {0}")]
    ArchiveUrl(String),

    #[error("Failed to unpack archive from {url}")]
    Archive {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to render template {path}")]
    Template {
        path: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to parse {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write {}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Filesystem error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StarterError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StarterError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml_error() -> serde_yaml::Error {
        serde_yaml::from_str::<u8>("not a number").unwrap_err()
    }

    #[test]
    fn test_read_and_write_failures_are_worded_apart() {
        let path = PathBuf::from("/srv/acme/.web-starter-drupal8.yaml");

        let read = StarterError::ConfigParse {
            path: path.clone(),
            source: yaml_error(),
        };
        let write = StarterError::ConfigWrite {
            path,
            source: yaml_error(),
        };

        assert_eq!(
            read.to_string(),
            "Failed to parse /srv/acme/.web-starter-drupal8.yaml"
        );
        assert_eq!(
            write.to_string(),
            "Failed to write /srv/acme/.web-starter-drupal8.yaml"
        );
    }
}
