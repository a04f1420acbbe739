//! Well-known names shared by the library and its hosts.

/// Default name of the target file loaded by the CLI.
pub const TARGET_FILE: &str = "targets.toml";

/// Qualified name of the running target, set for every phase.
pub const ENV_TARGET: &str = "STAGEHAND_TARGET";

/// Name of the running script, set for every phase.
pub const ENV_SCRIPT: &str = "STAGEHAND_SCRIPT";

/// Selected deployment environment, set when one is chosen.
pub const ENV_ENVIRONMENT: &str = "STAGEHAND_ENVIRONMENT";

/// Shell-ready form of the run phase, set for the run phase only.
pub const ENV_DEBUG_CMD: &str = "STAGEHAND_DEBUG_CMD";

/// Separator used to join the commands of one phase.
pub const COMMAND_JOINER: &str = " && ";

/// Prefix of the label derived from a target's build command.
pub const BUILD_COMMAND_LABEL_PREFIX: &str = "cmd:";

/// OS variables forwarded to every target.
pub const DEFAULT_PASS_ENV: &[&str] = &["PATH", "HOME"];
