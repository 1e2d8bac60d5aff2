//! Network collaborators
//!
//! - `releases`: release metadata feed and version tag selection
//! - `archive`: base distribution download, unpack and cache

pub mod archive;
pub mod releases;

pub use archive::ArchiveFetcher;
pub use releases::{offer_saved_version, supported_tags, ReleaseRecord, ReleaseSource};
