//! Template loading, partitioning, rendering and copying
//!
//! This module provides:
//! - Template sources (built-in tree or a local directory)
//! - The manifest that assigns each template file a destination
//! - Tera rendering with the generator's variables
//! - The file operations used by the write phase

pub mod copier;
pub mod fetcher;
pub mod manifest;
pub mod render;

pub use copier::AliasOutcome;
pub use fetcher::{TemplateSource, TemplateTree};
pub use manifest::{Destination, ManifestEntry, TemplateManifest};
pub use render::{render, template_context};
