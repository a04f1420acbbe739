//! stagehand-lib: scripted multi-phase target execution
//!
//! This crate turns declarative target descriptions into shell invocations:
//! - `placeholder`: the `$${...}` grammar used inside commands
//! - `script`: script definitions and the builder that validates them
//! - `execute`: phase planning, the pre/run/post driver and the shell invoker
//! - `target`: target files, target construction and environment assembly

pub mod consts;
pub mod execute;
pub mod placeholder;
pub mod script;
pub mod target;
pub mod util;
