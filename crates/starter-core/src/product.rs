//! Generator profile trait for CLI binaries
//!
//! This trait defines the identity and remote endpoints of a generator binary.
//! The scaffolding behavior itself lives in the workflow; a profile only
//! tells it what to call itself and where to fetch releases from.

use crate::config::Config;
use std::path::Path;

/// Configuration trait for generator binaries
///
/// Each binary implements this trait to define:
/// - Generator identity (name, display name, package version)
/// - The platform tag and supported release line
/// - Release metadata and archive URLs, with env overrides
/// - Post-generation instructions
pub trait GeneratorProfile: Clone + Send + Sync + 'static {
    /// Generator name (config file name, module key in the project context)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Package version recorded as a dev dependency of the generated project
    fn package_version(&self) -> &'static str;

    /// Platform tag pinned into the project context
    fn platform(&self) -> &'static str;

    /// Major version family offered at the version prompt
    fn supported_major(&self) -> u64;

    /// Default URL of the release metadata feed
    fn default_releases_url(&self) -> &'static str;

    /// Environment variable name for overriding the release feed URL
    fn releases_url_env(&self) -> &'static str;

    /// Package name of the base distribution archive
    fn archive_package(&self) -> &'static str;

    /// Default archive URL, with `{version}` as placeholder
    fn default_archive_url(&self) -> &'static str;

    /// Environment variable name for overriding the archive URL
    fn archive_url_env(&self) -> &'static str;

    /// Generate the "next steps" instructions after project creation
    fn next_steps(&self, dir: &Path, config: &Config) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
