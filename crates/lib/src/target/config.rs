//! Declarative target configuration.
//!
//! A target file is TOML with an optional `[settings]` table and one
//! `[[exec]]` table per target:
//!
//! ```toml
//! [settings]
//! label_build_command = true
//!
//! [[exec]]
//! name = "app"
//! build = ["cargo build --release"]
//! outs = ["target/release/app"]
//!
//! [exec.scripts.lint]
//! command = ["cargo clippy"]
//!
//! [exec.environments.prod]
//! env = { API_URL = "https://api.example.com" }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::script::RawScript;

/// Project-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  /// Add a `cmd:<base64>` label derived from each target's build command.
  pub label_build_command: bool,
  /// Interpreter override for every target, e.g. `bash` or `pwsh`.
  pub shell: Option<String>,
}

/// A named deployment environment, selected when a script runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
  /// Layered over the target environment and under script overlays.
  pub env: BTreeMap<String, String>,
}

/// One `[[exec]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub desc: Option<String>,
  /// Commands of the primary `build` script.
  #[serde(default)]
  pub build: Vec<String>,
  #[serde(default)]
  pub srcs: Vec<String>,
  /// Named source groups, addressed as `$${srcs:<group>}`.
  #[serde(default)]
  pub mapped_srcs: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub outs: Vec<String>,
  #[serde(default)]
  pub scripts: BTreeMap<String, RawScript>,
  /// Working directory override; may contain placeholders.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub external_path: Option<String>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub deps: Vec<String>,
  /// OS variables forwarded into the target environment.
  #[serde(default)]
  pub pass_env: Vec<String>,
  /// Like `pass_env`, but values are never displayed.
  #[serde(default)]
  pub secret_env: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  /// Tool name to a literal command, or to a target label whose outputs
  /// are used.
  #[serde(default)]
  pub tools: BTreeMap<String, String>,
  /// Deployment environments by name.
  #[serde(default)]
  pub environments: BTreeMap<String, EnvironmentConfig>,
  #[serde(default)]
  pub visibility: Vec<String>,
  /// Pass command strings to the shell without placeholder substitution.
  #[serde(default)]
  pub no_interpolation: bool,
}

/// The whole target file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub exec: Vec<TargetConfig>,
}

impl ProjectFile {
  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }
}
