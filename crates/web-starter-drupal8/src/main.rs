//! web-starter-drupal8 - Drupal 8 project generator

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use starter_core::tui::CreateArgs;
use starter_core::{Config, GeneratorProfile, PartialConfig, TemplateSource};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Drupal 8 generator profile
#[derive(Clone)]
pub struct Drupal8Profile;

impl GeneratorProfile for Drupal8Profile {
    fn name(&self) -> &'static str {
        "web-starter-drupal8"
    }

    fn display_name(&self) -> &'static str {
        "web-starter: Drupal 8"
    }

    fn package_version(&self) -> &'static str {
        CLI_VERSION
    }

    fn platform(&self) -> &'static str {
        "drupal8"
    }

    fn supported_major(&self) -> u64 {
        8
    }

    fn default_releases_url(&self) -> &'static str {
        "https://www.drupal.org/api-d7/node.json?type=project_release&field_release_project=3060&field_release_version_major=8&limit=100"
    }

    fn releases_url_env(&self) -> &'static str {
        "DRUPAL8_RELEASES_URL"
    }

    fn archive_package(&self) -> &'static str {
        "drupal"
    }

    fn default_archive_url(&self) -> &'static str {
        "https://ftp.drupal.org/files/projects/drupal-{version}.zip"
    }

    fn archive_url_env(&self) -> &'static str {
        "DRUPAL8_ARCHIVE_URL"
    }

    fn next_steps(&self, dir: &Path, config: &Config) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        // Step 1: cd to directory if not current
        if current.as_ref() != Some(&dir.to_path_buf()) {
            steps.push(format!("cd {}", dir.display()));
        }

        // Step 2: Fetch PHP dependencies
        if config.composer {
            steps.push("composer install".to_string());
        }

        // Step 3: Open README for instructions
        steps.push("Open README.md to get started".to_string());

        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "web-starter-drupal8")]
#[command(about = "Generate the Drupal 8 parts of a web-starter project")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate (or update) a Drupal 8 project
    Create(CliCreateArgs),
    /// Show where each template would be written, without writing anything
    Plan(PlanArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct CliCreateArgs {
    /// Local directory to use for templates instead of the built-in ones (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Project directory to generate into
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Project machine name (used for the Drush alias file)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Use Composer to manage PHP dependencies
    #[arg(long, value_name = "BOOL")]
    pub composer: Option<bool>,

    /// Drupal version to use
    #[arg(long = "drupal-version", value_name = "VERSION")]
    pub drupal_version: Option<String>,

    /// Whether the site uses the Features module
    #[arg(long, value_name = "BOOL")]
    pub features: Option<bool>,

    /// Theme machine name
    #[arg(short, long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Install a fresh copy of Drupal into the document root
    #[arg(long, value_name = "BOOL")]
    pub install: Option<bool>,

    /// Accept defaults for every question not answered by a flag (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            template_dir: args.template_dir,
            directory: args.directory,
            name: args.name,
            answers: PartialConfig {
                composer: args.composer,
                drupal_version: args.drupal_version,
                features: args.features,
                drupal_theme: args.theme,
                install_drupal: args.install,
            },
            yes: args.yes,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct PlanArgs {
    /// Project directory to inspect
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Local directory to use for templates instead of the built-in ones
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    // Diagnostics go to stderr, quiet unless RUST_LOG asks for more
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let profile = Drupal8Profile;

    match args.command {
        Some(Command::Plan(plan_args)) => {
            let source = match plan_args.template_dir {
                Some(dir) => TemplateSource::local(dir),
                None => TemplateSource::Builtin,
            };
            if let Err(e) =
                starter_core::plan::print_plan(&profile, &plan_args.directory, &source).await
            {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
            Ok(())
        }
        command => {
            // No subcommand provided, default to create behavior (interactive mode)
            let create_args = match command {
                Some(Command::Create(create_args)) => create_args,
                _ => CliCreateArgs::default(),
            };
            let result = starter_core::run(&profile, create_args.into()).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
    }
}
