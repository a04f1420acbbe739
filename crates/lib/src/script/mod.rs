//! Script definitions.
//!
//! A target carries one primary `build` script and any number of named
//! scripts. Each script holds raw commands for its pre, run and post phases.

pub mod builder;
pub mod types;

pub use builder::{ScriptError, build_scripts};
pub use types::{BUILD_SCRIPT, Phase, RawScript, ScriptDef, ScriptSet};
