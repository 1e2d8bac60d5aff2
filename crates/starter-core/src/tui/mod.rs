//! Interactive generator run with cliclack prompts
//!
//! Only compiled with the `tui` feature. Callers without a terminal can drive
//! `ScaffoldWorkflow` directly.

#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use prompts::{run, CreateArgs};
