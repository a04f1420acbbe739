//! Script set construction.
//!
//! Turns the `scripts` table of a target plus its top-level build command
//! into a validated [`ScriptSet`].

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use super::types::{BUILD_SCRIPT, RawScript, ScriptDef, ScriptSet};

/// Configuration errors detected while building a script set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
  /// A named script has no main commands.
  #[error("no commands provided for {script}")]
  MissingCommand { script: String },

  /// A `build` script was declared next to a top-level build command.
  #[error("script 'build' conflicts with the top-level build command; declare one or the other")]
  BuildScriptConflict,
}

/// Build the script set of a target.
///
/// The primary `build` script takes `build_command` as its main commands and
/// `deps` as its dependencies. A user-declared `build` entry is only accepted
/// when `build_command` is empty; it then becomes the primary script and
/// inherits the top-level dependencies.
///
/// Every other script must declare at least one main command. Validation
/// runs in name order over all entries before anything is returned.
pub fn build_scripts(
  mut raw_scripts: BTreeMap<String, RawScript>,
  build_command: &[String],
  deps: &[String],
) -> Result<ScriptSet, ScriptError> {
  let user_build = raw_scripts.remove(BUILD_SCRIPT);

  for (name, raw) in &raw_scripts {
    if raw.command.is_empty() {
      return Err(ScriptError::MissingCommand { script: name.clone() });
    }
  }

  let primary = match user_build {
    Some(_) if !build_command.is_empty() => return Err(ScriptError::BuildScriptConflict),
    Some(raw) => {
      debug!("using declared build script as primary");
      let mut def = ScriptDef::from_raw(BUILD_SCRIPT, raw);
      for dep in deps {
        if !def.deps.contains(dep) {
          def.deps.push(dep.clone());
        }
      }
      def
    }
    None => ScriptDef {
      name: BUILD_SCRIPT.to_string(),
      pre: Vec::new(),
      run: build_command.to_vec(),
      post: Vec::new(),
      deps: deps.to_vec(),
      env: BTreeMap::new(),
    },
  };

  let named = raw_scripts
    .into_iter()
    .map(|(name, raw)| {
      let def = ScriptDef::from_raw(&name, raw);
      (name, def)
    })
    .collect();

  Ok(ScriptSet { primary, named })
}
