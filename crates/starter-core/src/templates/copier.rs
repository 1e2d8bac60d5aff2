//! File operations of the write phase
//!
//! Every operation enumerates its inputs completely before the first write,
//! so targets never depend on a directory that is changing underneath.

use crate::error::{Result, StarterError};
use crate::templates::fetcher::{slash_path, TemplateTree};
use crate::templates::manifest::ManifestEntry;
use crate::templates::render;
use std::path::{Path, PathBuf};
use tera::Context;
use tokio::fs;
use walkdir::WalkDir;

/// What happened to the project's site alias file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasOutcome {
    /// Rendered to the given project-relative path
    Created(String),
    /// Left untouched because it already existed
    Kept(String),
    /// The template tree has no alias template
    NoTemplate,
}

/// Render manifest entries into `target_dir`
///
/// Returns the written paths relative to `target_dir`.
pub async fn render_entries<'a>(
    tree: &TemplateTree,
    entries: impl IntoIterator<Item = &'a ManifestEntry>,
    target_dir: &Path,
    context: &Context,
) -> Result<Vec<String>> {
    let mut written = Vec::new();

    for entry in entries {
        let relative = entry.relative_target();
        render_file(tree, &entry.path, &target_dir.join(relative), context).await?;
        written.push(relative.to_string());
    }

    Ok(written)
}

/// Render the alias template to `target` unless a file is already there
pub async fn render_alias(
    tree: &TemplateTree,
    entry: &ManifestEntry,
    target: &Path,
    display: String,
    context: &Context,
) -> Result<AliasOutcome> {
    if fs::try_exists(target)
        .await
        .map_err(|e| StarterError::io(target, e))?
    {
        tracing::info!(path = %target.display(), "keeping existing alias file");
        return Ok(AliasOutcome::Kept(display));
    }

    render_file(tree, &entry.path, target, context).await?;
    Ok(AliasOutcome::Created(display))
}

async fn render_file(
    tree: &TemplateTree,
    template_path: &str,
    target: &Path,
    context: &Context,
) -> Result<()> {
    let content = tree.get(template_path).ok_or_else(|| {
        StarterError::io(
            template_path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "template not found"),
        )
    })?;
    let rendered = render::render(template_path, content, context)?;
    write_file(target, &rendered).await?;
    tracing::debug!(template = template_path, target = %target.display(), "rendered");
    Ok(())
}

/// Move every file under `from` to the same relative path under `to`
///
/// A missing `from` directory is not an error. Returns the moved paths
/// relative to `to`.
pub async fn relocate(from: &Path, to: &Path) -> Result<Vec<String>> {
    let files = list_files(from)?;
    let mut moved = Vec::with_capacity(files.len());

    for relative in files {
        let source = from.join(&relative);
        let target = to.join(&relative);
        ensure_parent(&target).await?;

        if fs::rename(&source, &target).await.is_err() {
            // Different filesystems: fall back to copy and delete
            fs::copy(&source, &target)
                .await
                .map_err(|e| StarterError::io(&target, e))?;
            fs::remove_file(&source)
                .await
                .map_err(|e| StarterError::io(&source, e))?;
        }

        tracing::debug!(from = %source.display(), to = %target.display(), "relocated");
        moved.push(slash_path(&relative));
    }

    Ok(moved)
}

/// Copy every file under `from` to the same relative path under `to`
pub async fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let files = list_files(from)?;

    for relative in &files {
        let target = to.join(relative);
        ensure_parent(&target).await?;
        fs::copy(from.join(relative), &target)
            .await
            .map_err(|e| StarterError::io(&target, e))?;
    }

    Ok(files.len())
}

/// All files below `root`, relative to it, including dotfiles and symlinked files
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            StarterError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

async fn write_file(target: &Path, content: &[u8]) -> Result<()> {
    ensure_parent(target).await?;
    fs::write(target, content)
        .await
        .map_err(|e| StarterError::io(target, e))
}

async fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StarterError::io(parent, e))?;
    }
    Ok(())
}
