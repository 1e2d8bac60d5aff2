//! Generator answers: layered resolution and persistence
//!
//! - `layers`: the `Config` answer set, its defaults and precedence rules
//! - `store`: the per-project file that keeps answers across re-runs

pub mod layers;
pub mod store;

pub use layers::{validate_theme_name, Config, PartialConfig};
pub use store::ConfigStore;
