//! Starter Core - library behind the web-starter Drupal 8 generator
//!
//! The generator asks a handful of questions (Composer, Drupal version,
//! Features, theme name, fresh install), then renders a fixed template tree
//! into a project directory, optionally unpacking a Drupal core archive into
//! the document root first.
//!
//! # Architecture
//!
//! - **Core operations** - release metadata, archive cache, template loading,
//!   manifest partitioning, rendering and file moves
//! - **Workflow** - `ScaffoldWorkflow` and its phase states
//!   (`Initialized` → `Prompted` → `Configured` → `Generated`)
//! - **CLI/TUI interface** - optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use starter_core::{config::PartialConfig, project::ProjectContext, workflow::ScaffoldWorkflow};
//!
//! let initialized = ScaffoldWorkflow::new(MyProfile, ProjectContext::new("acme"), dir.clone())
//!     .initialize()
//!     .await?;
//! let plan = initialized.prompt_plan(&ReleaseSource::from_profile(&MyProfile)?).await?;
//! let config = plan.complete(&PartialConfig::default())?;
//! let generated = initialized
//!     .answer(config)
//!     .await?
//!     .configure()
//!     .write(&ArchiveFetcher::from_profile(&MyProfile), &TemplateSource::Builtin.load()?)
//!     .await?;
//! generated.project.save(&dir).await?;
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod product;
pub mod project;
pub mod remote;
pub mod templates;
pub mod workflow;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{Config, PartialConfig};
pub use error::{Result, StarterError};
pub use product::GeneratorProfile;
pub use project::ProjectContext;
pub use remote::{ArchiveFetcher, ReleaseSource};
pub use templates::{TemplateSource, TemplateTree};
pub use workflow::{Generated, Layout, ScaffoldWorkflow, WriteReport};

#[cfg(feature = "tui")]
pub use tui::run;
