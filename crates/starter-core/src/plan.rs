//! Dry run: show where each template would be written

use crate::config::{Config, ConfigStore};
use crate::error::Result;
use crate::product::GeneratorProfile;
use crate::project::ProjectContext;
use crate::templates::copier::list_files;
use crate::templates::fetcher::slash_path;
use crate::templates::{Destination, TemplateManifest, TemplateSource};
use crate::workflow::{Layout, LEGACY_TOOL_DIR};
use colored::Colorize;
use std::path::Path;

/// One template file and the project path it would be rendered to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub template: String,
    pub destination: Destination,
    /// `None` when the template is never rendered
    pub target: Option<String>,
    /// The target exists and will be left alone
    pub kept: bool,
}

/// What a run would do in a project directory
#[derive(Debug, Clone)]
pub struct Plan {
    pub layout: Layout,
    pub files: Vec<PlannedFile>,
    /// Legacy Drush files that would move to `drush/`, relative to the old location
    pub relocations: Vec<String>,
}

/// Compute the plan for `project_dir` from its saved answers and context
pub async fn plan<P: GeneratorProfile>(
    profile: &P,
    project_dir: &Path,
    source: &TemplateSource,
) -> Result<Plan> {
    let fallback_name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());
    let project = ProjectContext::load_or_new(project_dir, &fallback_name).await?;
    let saved = ConfigStore::new(project_dir, profile.name()).load().await?;
    let config = saved.over(Config::default());

    let layout = Layout::derive(&project, &config);
    let tree = source.load()?;
    let manifest = TemplateManifest::partition(tree.paths());

    let files = manifest
        .entries()
        .iter()
        .map(|entry| {
            let target = layout.target(entry, &project.name);
            let kept = entry.destination == Destination::AliasTemplate
                && target
                    .as_ref()
                    .is_some_and(|t| project_dir.join(t).exists());
            PlannedFile {
                template: entry.path.clone(),
                destination: entry.destination,
                target,
                kept,
            }
        })
        .collect();

    let relocations = list_files(&project_dir.join(&layout.doc_root).join(LEGACY_TOOL_DIR))?
        .iter()
        .map(|p| slash_path(p))
        .collect();

    Ok(Plan {
        layout,
        files,
        relocations,
    })
}

/// Print the plan for `project_dir`
pub async fn print_plan<P: GeneratorProfile>(
    profile: &P,
    project_dir: &Path,
    source: &TemplateSource,
) -> Result<()> {
    let Plan {
        layout,
        files,
        relocations,
    } = plan(profile, project_dir, source).await?;

    println!(
        "{}",
        format!("{} plan for {}", profile.display_name(), project_dir.display())
            .cyan()
            .bold()
    );
    println!("  document root: {}", layout.doc_root.bold());
    println!("  theme path:    {}", layout.theme_path.bold());
    println!();

    for relative in &relocations {
        println!(
            "  {} {}/{}/{} -> drush/{}",
            "move".yellow(),
            layout.doc_root,
            LEGACY_TOOL_DIR,
            relative,
            relative
        );
    }

    for file in &files {
        match &file.target {
            Some(target) if file.kept => {
                println!("  {} {} (exists)", "keep".blue(), target);
            }
            Some(target) => {
                println!("  {} {} <- {}", "write".green(), target, file.template.dimmed());
            }
            None => {
                println!("  {} {}", "skip".dimmed(), file.template.dimmed());
            }
        }
    }

    Ok(())
}
