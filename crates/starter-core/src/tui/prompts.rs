//! Charm-style CLI prompts using cliclack

use crate::config::{validate_theme_name, Config, PartialConfig};
use crate::product::GeneratorProfile;
use crate::project::ProjectContext;
use crate::remote::{ArchiveFetcher, ReleaseSource};
use crate::templates::{AliasOutcome, TemplateSource, TemplateTree};
use crate::workflow::{Configured, Generated, Initialized, PromptPlan, ScaffoldWorkflow};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Local directory to use for templates instead of the built-in ones
    pub template_dir: Option<PathBuf>,

    /// Project directory to generate into
    pub directory: Option<PathBuf>,

    /// Project machine name (defaults to the project context, then the directory name)
    pub name: Option<String>,

    /// Answers given on the command line; these questions are not asked
    pub answers: PartialConfig,

    /// Accept defaults for every question not answered on the command line
    pub yes: bool,
}

/// Run the generator with interactive prompts
pub async fn run<P: GeneratorProfile>(profile: &P, args: CreateArgs) -> Result<()> {
    cliclack::intro(profile.display_name())?;

    // Step 1: Resolve project directory and context
    let project_dir = select_directory(&args)?;
    let project = load_project(&project_dir, args.name.as_deref()).await?;

    // Step 2: Initialize
    let workflow = ScaffoldWorkflow::new(profile.clone(), project, project_dir.clone())
        .initialize()
        .await?;
    if *workflow.saved() != PartialConfig::default() {
        cliclack::log::info("Using answers saved by a previous run as defaults")?;
    }

    // Step 3: Prompt
    let plan = load_plan(profile, &workflow).await?;
    let config = ask_questions(&plan, &args)?;
    let prompted = workflow.answer(config).await?;

    // Step 4: Configure
    let configured = prompted.configure();
    cliclack::log::info(format!(
        "Document root: {}, theme path: {}",
        configured.layout().doc_root,
        configured.layout().theme_path
    ))?;

    // Step 5: Write
    let templates = setup_templates(&args.template_dir)?;
    let archive = ArchiveFetcher::from_profile(profile);
    let generated = create_project(configured, &archive, &templates, &project_dir).await?;

    generated
        .project
        .save(&project_dir)
        .await
        .context("Failed to save project context")?;

    // Step 6: Show next steps
    print_next_steps(profile, &project_dir, &generated.config)?;

    Ok(())
}

fn select_directory(args: &CreateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Use --directory flag if provided
    let path = if let Some(dir) = &args.directory {
        let p = if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        };
        cliclack::log::info(format!("Using directory: {}", p.display()))?;
        p
    } else if args.yes {
        current_dir
    } else {
        let input: String = cliclack::input("Project directory")
            .placeholder(".")
            .default_input(".")
            .interact()?;

        if input.is_empty() || input == "." {
            current_dir
        } else {
            let p = PathBuf::from(&input);
            if p.is_absolute() {
                p
            } else {
                current_dir.join(p)
            }
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    Ok(path)
}

async fn load_project(project_dir: &Path, name: Option<&str>) -> Result<ProjectContext> {
    let dir_name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());

    let mut project = ProjectContext::load_or_new(project_dir, &dir_name).await?;
    if let Some(name) = name {
        project.name = name.to_string();
    }

    if project.deployment.is_some() {
        cliclack::log::info("Capistrano deployment detected")?;
    }

    Ok(project)
}

async fn load_plan<P: GeneratorProfile>(
    profile: &P,
    workflow: &Initialized<P>,
) -> Result<PromptPlan> {
    let spinner = cliclack::spinner();
    spinner.start("Fetching Drupal releases...");

    let releases = ReleaseSource::from_profile(profile)?;
    match workflow.prompt_plan(&releases).await {
        Ok(plan) => {
            spinner.stop(format!(
                "Found {} Drupal {}.x release(s)",
                plan.tags.len(),
                profile.supported_major()
            ));
            Ok(plan)
        }
        Err(e) => {
            spinner.stop("Failed to fetch releases");
            Err(e.into())
        }
    }
}

/// Ask the five questions, skipping those answered on the command line
fn ask_questions(plan: &PromptPlan, args: &CreateArgs) -> Result<Config> {
    let given = &args.answers;
    let defaults = &plan.defaults;
    let ask = |answered: bool| !answered && !args.yes;

    let composer = if ask(given.composer.is_some()) {
        Some(
            cliclack::confirm("Use Composer to manage PHP dependencies?")
                .initial_value(defaults.composer)
                .interact()?,
        )
    } else {
        given.composer
    };

    let drupal_version = if ask(given.drupal_version.is_some()) {
        let mut select = cliclack::select("Select a version of Drupal");
        for tag in &plan.tags {
            select = select.item(tag.clone(), tag, "");
        }
        let version: String = select
            .initial_value(defaults.drupal_version.clone())
            .interact()?;
        Some(version)
    } else {
        if let Some(version) = &given.drupal_version {
            if !plan.tags.contains(version) {
                cliclack::log::warning(format!(
                    "Drupal {} is not among the published releases",
                    version
                ))?;
            }
        }
        given.drupal_version.clone()
    };

    let features = if ask(given.features.is_some()) {
        Some(
            cliclack::confirm("Does it use the Features module?")
                .initial_value(defaults.features)
                .interact()?,
        )
    } else {
        given.features
    };

    let drupal_theme = if ask(given.drupal_theme.is_some()) {
        let theme: String = cliclack::input("Theme name (machine name)")
            .default_input(&defaults.drupal_theme)
            .validate(|input: &String| validate_theme_name(input))
            .interact()?;
        Some(theme)
    } else {
        given.drupal_theme.clone()
    };

    let install_drupal = if ask(given.install_drupal.is_some()) {
        Some(
            cliclack::confirm("Install a fresh copy of Drupal?")
                .initial_value(defaults.install_drupal)
                .interact()?,
        )
    } else {
        given.install_drupal
    };

    let answers = PartialConfig {
        composer,
        drupal_version,
        features,
        drupal_theme,
        install_drupal,
    };
    Ok(plan.complete(&answers)?)
}

fn setup_templates(template_dir: &Option<PathBuf>) -> Result<TemplateTree> {
    let source = match template_dir {
        Some(path) => {
            cliclack::log::info(format!("Using local templates from {}", path.display()))?;
            TemplateSource::local(path.clone())
        }
        None => TemplateSource::Builtin,
    };

    Ok(source.load()?)
}

async fn create_project<P: GeneratorProfile>(
    configured: Configured<P>,
    archive: &ArchiveFetcher,
    templates: &TemplateTree,
    project_dir: &Path,
) -> Result<Generated> {
    let spinner = cliclack::spinner();
    if configured.config().install_drupal {
        spinner.start(format!(
            "Installing Drupal {} and writing project files...",
            configured.config().drupal_version
        ));
    } else {
        spinner.start("Writing project files...");
    }

    let generated = match configured.write(archive, templates).await {
        Ok(generated) => generated,
        Err(e) => {
            spinner.stop("Failed to write project");
            return Err(e.into());
        }
    };

    let report = &generated.report;
    spinner.stop(format!(
        "Rendered {} files in {}",
        report.rendered(),
        project_dir.display()
    ));

    if report.installed > 0 {
        cliclack::log::success(format!(
            "Installed Drupal {} ({} files)",
            generated.config.drupal_version, report.installed
        ))?;
    }
    if !report.relocated.is_empty() {
        cliclack::log::info(format!(
            "Moved {} Drush file(s) from {}/sites/all/drush to drush/",
            report.relocated.len(),
            generated.layout.doc_root
        ))?;
    }
    match &report.alias {
        AliasOutcome::Created(path) => cliclack::log::success(format!("Created {}", path))?,
        AliasOutcome::Kept(path) => cliclack::log::info(format!("Kept existing {}", path))?,
        AliasOutcome::NoTemplate => {}
    }

    Ok(generated)
}

fn print_next_steps<P: GeneratorProfile>(
    profile: &P,
    project_dir: &Path,
    config: &Config,
) -> Result<()> {
    let steps = profile.next_steps(project_dir, config);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}
