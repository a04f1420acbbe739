use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the primary script every target carries.
pub const BUILD_SCRIPT: &str = "build";

/// One of the three ordered stages of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Pre,
  Run,
  Post,
}

impl Phase {
  /// Execution order of the phases.
  pub const ORDER: [Phase; 3] = [Phase::Pre, Phase::Run, Phase::Post];

  pub fn as_str(&self) -> &'static str {
    match self {
      Phase::Pre => "pre",
      Phase::Run => "run",
      Phase::Post => "post",
    }
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A script as written in a target configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawScript {
  #[serde(default)]
  pub pre: Vec<String>,
  #[serde(default)]
  pub command: Vec<String>,
  #[serde(default)]
  pub post: Vec<String>,
  #[serde(default)]
  pub deps: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
}

/// A validated script definition.
///
/// Created once during target construction and never mutated afterwards.
/// Commands are raw strings; interpolation happens when a phase is prepared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDef {
  pub name: String,
  pub pre: Vec<String>,
  pub run: Vec<String>,
  pub post: Vec<String>,
  pub deps: Vec<String>,
  pub env: BTreeMap<String, String>,
}

impl ScriptDef {
  pub(crate) fn from_raw(name: &str, raw: RawScript) -> Self {
    Self {
      name: name.to_string(),
      pre: raw.pre,
      run: raw.command,
      post: raw.post,
      deps: raw.deps,
      env: raw.env,
    }
  }

  /// Raw commands of one phase.
  pub fn commands(&self, phase: Phase) -> &[String] {
    match phase {
      Phase::Pre => &self.pre,
      Phase::Run => &self.run,
      Phase::Post => &self.post,
    }
  }

  /// True when no phase has any command.
  pub fn is_empty(&self) -> bool {
    Phase::ORDER.iter().all(|p| self.commands(*p).is_empty())
  }
}

/// The scripts of one target.
///
/// The primary `build` script is held apart from the user-named ones so it
/// always exists and can never be shadowed by a map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSet {
  pub primary: ScriptDef,
  pub named: BTreeMap<String, ScriptDef>,
}

impl ScriptSet {
  /// Look up a script by name; `build` selects the primary script.
  pub fn get(&self, name: &str) -> Option<&ScriptDef> {
    if name == BUILD_SCRIPT {
      Some(&self.primary)
    } else {
      self.named.get(name)
    }
  }

  /// All scripts, primary first, then named scripts in name order.
  pub fn iter(&self) -> impl Iterator<Item = &ScriptDef> {
    std::iter::once(&self.primary).chain(self.named.values())
  }

  /// Script names in the same order as [`ScriptSet::iter`].
  pub fn names(&self) -> Vec<&str> {
    self.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn len(&self) -> usize {
    self.named.len() + 1
  }

  /// A script set always holds the primary script.
  pub fn is_empty(&self) -> bool {
    false
  }
}
