//! Template loading from the built-in tree or a local directory
//!
//! Both sources produce the same in-memory `TemplateTree`, so rendering does
//! not care where a template came from. A local directory is handy while
//! developing templates (`--template-dir`).

use crate::error::{Result, StarterError};
use include_dir::{include_dir, Dir, DirEntry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static BUILTIN_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/drupal8");

/// Template source - either compiled into the binary or a local directory
#[derive(Debug, Clone, Default)]
pub enum TemplateSource {
    #[default]
    Builtin,
    Local(PathBuf),
}

impl TemplateSource {
    /// Create a local template source from a path
    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }

    /// Read every template file of this source
    pub fn load(&self) -> Result<TemplateTree> {
        let mut files = BTreeMap::new();
        match self {
            Self::Builtin => collect_embedded(&BUILTIN_TEMPLATES, &mut files),
            Self::Local(root) => collect_local(root, &mut files)?,
        }
        tracing::debug!(source = ?self, count = files.len(), "loaded templates");
        Ok(TemplateTree { files })
    }
}

/// Template files keyed by `/`-separated path relative to the template root
#[derive(Debug, Clone, Default)]
pub struct TemplateTree {
    files: BTreeMap<String, Vec<u8>>,
}

impl TemplateTree {
    /// Build a tree from in-memory files
    pub fn from_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// All template paths, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn collect_embedded(dir: &Dir<'static>, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => collect_embedded(sub, files),
            DirEntry::File(file) => {
                files.insert(slash_path(file.path()), file.contents().to_vec());
            }
        }
    }
}

fn collect_local(root: &Path, files: &mut BTreeMap<String, Vec<u8>>) -> Result<()> {
    if !root.is_dir() {
        return Err(StarterError::io(
            root,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "template directory not found",
            ),
        ));
    }

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            StarterError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let content =
            std::fs::read(entry.path()).map_err(|e| StarterError::io(entry.path(), e))?;
        files.insert(slash_path(relative), content);
    }

    Ok(())
}

/// Relative path with `/` separators on every platform
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
