//! The generator run: initialize, prompt, configure, write
//!
//! Each phase consumes the state returned by the previous one, so the phases
//! can only run once and only in order:
//!
//! ```ignore
//! let initialized = ScaffoldWorkflow::new(profile, project, dir).initialize().await?;
//! let plan = initialized.prompt_plan(&releases).await?;
//! let prompted = initialized.answer(plan.complete(&answers)?).await?;
//! let generated = prompted.configure().write(&archive, &templates).await?;
//! generated.project.save(&dir).await?;
//! ```

use crate::config::{Config, ConfigStore, PartialConfig};
use crate::error::{Result, StarterError};
use crate::product::GeneratorProfile;
use crate::project::{DeploymentConfig, ProjectContext};
use crate::remote::{offer_saved_version, supported_tags, ArchiveFetcher, ReleaseSource};
use crate::templates::copier::{self, AliasOutcome};
use crate::templates::manifest::{
    Destination, ManifestEntry, TemplateManifest, ALIAS_TEMPLATE, TOOL_TREE,
};
use crate::templates::{template_context, TemplateTree};
use std::path::{Path, PathBuf};

/// Service whose `doc_root` becomes the document root
pub const WEB_SERVICE: &str = "web";

/// Document root used when no web service declares one
pub const DEFAULT_DOC_ROOT: &str = "public";

/// Drush config location inside the document root used by older projects
pub const LEGACY_TOOL_DIR: &str = "sites/all/drush";

/// Document root of the project
pub fn doc_root(project: &ProjectContext) -> String {
    project
        .service(WEB_SERVICE)
        .and_then(|service| service.doc_root.clone())
        .unwrap_or_else(|| DEFAULT_DOC_ROOT.to_string())
}

/// Project-specific file name of the site alias file
pub fn alias_file_name(project_name: &str) -> String {
    format!("{}.{}", project_name, ALIAS_TEMPLATE)
}

/// Paths derived once per run and used by every write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub doc_root: String,
    pub theme_path: String,
    pub build_path: String,
}

impl Layout {
    pub fn derive(project: &ProjectContext, config: &Config) -> Self {
        let doc_root = doc_root(project);
        let theme_path = format!("{}/themes/{}", doc_root, config.drupal_theme);
        Self {
            build_path: theme_path.clone(),
            theme_path,
            doc_root,
        }
    }

    /// Project-relative target of a manifest entry, `None` if it is not rendered
    pub fn target(&self, entry: &ManifestEntry, project_name: &str) -> Option<String> {
        match entry.destination {
            Destination::DocRoot => Some(format!("{}/{}", self.doc_root, entry.relative_target())),
            Destination::ToolConfig => Some(format!("{}/{}", TOOL_TREE, entry.relative_target())),
            Destination::AliasTemplate => {
                Some(format!("{}/{}", TOOL_TREE, alias_file_name(project_name)))
            }
            Destination::ProjectRoot => Some(entry.path.clone()),
            Destination::Ignored => None,
        }
    }
}

/// Add this generator's settings to the deployment generator's config
pub fn extend_deployment(deployment: &mut DeploymentConfig, config: &Config, layout: &Layout) {
    deployment.set("drupal_features", config.features);
    deployment.set("drupal_db_updates", "true");
    deployment.set(
        "linked_dirs",
        format!("%w[{}/sites/default/files]", layout.doc_root),
    );
}

/// Values every phase needs
struct Run<P> {
    profile: P,
    project: ProjectContext,
    destination: PathBuf,
    store: ConfigStore,
}

/// Entry point of a generator run
pub struct ScaffoldWorkflow<P> {
    run: Run<P>,
}

impl<P: GeneratorProfile> ScaffoldWorkflow<P> {
    pub fn new(profile: P, project: ProjectContext, destination: PathBuf) -> Self {
        let store = ConfigStore::new(&destination, profile.name());
        Self {
            run: Run {
                profile,
                project,
                destination,
                store,
            },
        }
    }

    /// Register the generator with the project and load its saved answers
    pub async fn initialize(self) -> Result<Initialized<P>> {
        let mut run = self.run;

        run.project.dev_dependencies.insert(
            run.profile.name().to_string(),
            format!("~{}", run.profile.package_version()),
        );
        run.project.platform = Some(run.profile.platform().to_string());

        let saved = run.store.load().await?;
        tracing::info!(generator = run.profile.name(), "initialized");

        Ok(Initialized { run, saved })
    }
}

/// Questions ready to be asked: version choices and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPlan {
    pub tags: Vec<String>,
    pub defaults: Config,
}

impl PromptPlan {
    /// Combine fetched tags with the saved answers
    pub fn new(tags: Vec<String>, saved: &PartialConfig, major: u64) -> Result<Self> {
        let tags = offer_saved_version(tags, saved.drupal_version.as_deref());

        let mut defaults = saved.over(Config::default());
        // A fresh install is always opt-in
        defaults.install_drupal = false;

        if defaults.drupal_version.is_empty() {
            defaults.drupal_version = tags
                .first()
                .cloned()
                .ok_or(StarterError::NoReleases { major })?;
        }

        Ok(Self { tags, defaults })
    }

    /// Fill unanswered questions with their defaults and validate the result
    pub fn complete(&self, answers: &PartialConfig) -> Result<Config> {
        let config = answers.over(self.defaults.clone());
        config.validate()?;
        if config.drupal_version.is_empty() {
            return Err(StarterError::Validation(
                "A Drupal version is required".to_string(),
            ));
        }
        Ok(config)
    }
}

/// State after `initialize`
pub struct Initialized<P> {
    run: Run<P>,
    saved: PartialConfig,
}

impl<P: GeneratorProfile> Initialized<P> {
    /// Answers saved by a previous run
    pub fn saved(&self) -> &PartialConfig {
        &self.saved
    }

    pub fn project(&self) -> &ProjectContext {
        &self.run.project
    }

    /// Fetch release tags and compute question defaults
    pub async fn prompt_plan(&self, releases: &ReleaseSource) -> Result<PromptPlan> {
        let major = self.run.profile.supported_major();
        let records = releases.fetch().await?;
        PromptPlan::new(supported_tags(&records, major), &self.saved, major)
    }

    /// Accept the answers: persist them and publish them to the project
    pub async fn answer(self, config: Config) -> Result<Prompted<P>> {
        config.validate()?;
        let mut run = self.run;

        run.store.save(&config).await?;

        let published =
            serde_yaml::to_value(&config).map_err(|source| StarterError::ConfigWrite {
                path: run.store.path().to_path_buf(),
                source,
            })?;
        run.project
            .answers
            .insert(run.profile.name().to_string(), published);

        Ok(Prompted { run, config })
    }
}

/// State after the questions were answered
pub struct Prompted<P> {
    run: Run<P>,
    config: Config,
}

impl<P: GeneratorProfile> Prompted<P> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derive paths and share them with sibling generators
    pub fn configure(self) -> Configured<P> {
        let mut run = self.run;
        let config = self.config;
        let layout = Layout::derive(&run.project, &config);

        if let Some(deployment) = run.project.deployment.as_mut() {
            extend_deployment(deployment, &config, &layout);
        }
        run.project.theme_path = Some(layout.theme_path.clone());
        run.project.build_path = Some(layout.build_path.clone());

        tracing::info!(doc_root = %layout.doc_root, theme_path = %layout.theme_path, "configured");
        Configured {
            run,
            config,
            layout,
        }
    }
}

/// Files touched by the write phase, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Files copied from the base distribution
    pub installed: usize,
    pub doc_root: Vec<String>,
    pub relocated: Vec<String>,
    pub tool_config: Vec<String>,
    pub alias: AliasOutcome,
    pub project_root: Vec<String>,
}

impl WriteReport {
    /// Number of files rendered from templates
    pub fn rendered(&self) -> usize {
        let alias = usize::from(matches!(self.alias, AliasOutcome::Created(_)));
        self.doc_root.len() + self.tool_config.len() + self.project_root.len() + alias
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct Generated {
    pub config: Config,
    pub layout: Layout,
    pub report: WriteReport,
    /// Project context including the values this generator published
    pub project: ProjectContext,
}

/// State after `configure`
pub struct Configured<P> {
    run: Run<P>,
    config: Config,
    layout: Layout,
}

impl<P: GeneratorProfile> Configured<P> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn project(&self) -> &ProjectContext {
        &self.run.project
    }

    /// Materialize the project
    ///
    /// Steps run one after another: base install, document root templates,
    /// drush config (legacy files moved before new ones are rendered), then
    /// the remaining project files.
    pub async fn write(self, archive: &ArchiveFetcher, tree: &TemplateTree) -> Result<Generated> {
        let Configured {
            run,
            config,
            layout,
        } = self;
        let destination = run.destination.as_path();
        let context = template_context(&config, &run.project, &layout);
        let manifest = TemplateManifest::partition(tree.paths());
        let doc_root_dir = destination.join(&layout.doc_root);

        let installed = install_base(&run.profile, &config, archive, &doc_root_dir).await?;

        let doc_root = copier::render_entries(
            tree,
            manifest.of(Destination::DocRoot),
            &doc_root_dir,
            &context,
        )
        .await?;

        let tool_dir = destination.join(TOOL_TREE);
        let relocated = copier::relocate(&doc_root_dir.join(LEGACY_TOOL_DIR), &tool_dir).await?;
        let tool_config = copier::render_entries(
            tree,
            manifest.of(Destination::ToolConfig),
            &tool_dir,
            &context,
        )
        .await?;
        let alias = match manifest.alias_template() {
            Some(entry) => {
                let file_name = alias_file_name(&run.project.name);
                copier::render_alias(
                    tree,
                    entry,
                    &tool_dir.join(&file_name),
                    format!("{}/{}", TOOL_TREE, file_name),
                    &context,
                )
                .await?
            }
            None => AliasOutcome::NoTemplate,
        };

        let project_root = copier::render_entries(
            tree,
            manifest.of(Destination::ProjectRoot),
            destination,
            &context,
        )
        .await?;

        let report = WriteReport {
            installed,
            doc_root: prefixed(&layout.doc_root, doc_root),
            relocated: prefixed(TOOL_TREE, relocated),
            tool_config: prefixed(TOOL_TREE, tool_config),
            alias,
            project_root,
        };
        tracing::info!(rendered = report.rendered(), installed, "wrote project files");

        Ok(Generated {
            config,
            layout,
            report,
            project: run.project,
        })
    }
}

/// Copy the base distribution into the document root when requested
async fn install_base<P: GeneratorProfile>(
    profile: &P,
    config: &Config,
    archive: &ArchiveFetcher,
    doc_root_dir: &Path,
) -> Result<usize> {
    if !config.install_drupal {
        return Ok(0);
    }

    let cache = archive
        .fetch(profile.archive_package(), &config.drupal_version)
        .await?;
    copier::copy_tree(&cache, doc_root_dir).await
}

fn prefixed(prefix: &str, paths: Vec<String>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| format!("{}/{}", prefix, p))
        .collect()
}
