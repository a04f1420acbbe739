//! Lowering a script phase into a single invocation.
//!
//! Preparing a phase interpolates each raw command, joins them with `&&`
//! and renders the shell-ready form. The result is an immutable
//! [`PhasePlan`]; the invocation that is executed and the rendering that is
//! displayed both come from the same value.

use std::collections::BTreeMap;

use tracing::debug;

use crate::consts::{COMMAND_JOINER, ENV_DEBUG_CMD, ENV_SCRIPT};
use crate::placeholder::Interpolate;
use crate::script::{Phase, ScriptDef};

use super::ScriptContext;
use super::types::{ExecuteError, Invocation};

/// A prepared phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
  pub invocation: Invocation,
  /// `invocation.argv` rendered for the interpreter's shell family.
  pub debug_command: String,
}

impl PhasePlan {
  pub fn phase(&self) -> Phase {
    self.invocation.phase
  }

  pub fn command_line(&self) -> &str {
    self.invocation.command_line()
  }
}

/// Every phase of one script, prepared without executing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPlan {
  pub target: String,
  pub script: String,
  pub phases: Vec<PhasePlan>,
}

impl ScriptPlan {
  pub fn phase(&self, phase: Phase) -> Option<&PhasePlan> {
    self.phases.iter().find(|p| p.phase() == phase)
  }

  /// Debug command of the run phase.
  pub fn debug_command(&self) -> Option<&str> {
    self.phase(Phase::Run).map(|p| p.debug_command.as_str())
  }
}

/// Join already interpolated commands into one command line.
pub fn join_commands<S: AsRef<str>>(commands: &[S]) -> String {
  commands.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(COMMAND_JOINER)
}

/// Interpolate each raw command independently against `env`.
///
/// The first failure aborts with an error naming the raw command.
pub fn interpolate_commands(
  commands: &[String],
  interpolator: &impl Interpolate,
  env: &BTreeMap<String, String>,
) -> Result<Vec<String>, ExecuteError> {
  commands
    .iter()
    .map(|raw| {
      interpolator
        .interpolate_in(raw, env)
        .map_err(|source| ExecuteError::Interpolation {
          raw: raw.clone(),
          source,
        })
    })
    .collect()
}

/// Environment shared by every phase of `script`: the context's base
/// environment with the script overlay on top.
///
/// The returned map is a fresh copy, so overlays never reach other scripts.
pub fn script_env(ctx: &impl ScriptContext, script: &ScriptDef) -> BTreeMap<String, String> {
  let mut env = ctx.base_env().clone();
  env.extend(script.env.iter().map(|(k, v)| (k.clone(), v.clone())));
  env.insert(ENV_SCRIPT.to_string(), script.name.clone());
  env
}

/// Prepare one phase of `script`.
///
/// Returns `None` when the phase has no commands. `$${env:...}` resolves
/// against `env`, the script environment. The run phase also exports its
/// debug command under [`ENV_DEBUG_CMD`].
pub fn prepare_phase(
  phase: Phase,
  script: &ScriptDef,
  ctx: &impl ScriptContext,
  env: &BTreeMap<String, String>,
) -> Result<Option<PhasePlan>, ExecuteError> {
  let commands = script.commands(phase);
  if commands.is_empty() {
    return Ok(None);
  }

  let interpolated = interpolate_commands(commands, ctx, env)?;
  let command_line = join_commands(&interpolated);
  let shell = ctx.shell();
  let debug_command = shell.render(&command_line);

  debug!(%phase, script = %script.name, command_line = %ctx.mask(&command_line), "prepared phase");

  let mut env = env.clone();
  if phase == Phase::Run {
    env.insert(ENV_DEBUG_CMD.to_string(), debug_command.clone());
  }

  Ok(Some(PhasePlan {
    invocation: Invocation {
      phase,
      argv: shell.argv(&command_line),
      cwd: ctx.working_dir().to_path_buf(),
      env,
    },
    debug_command,
  }))
}

/// Prepare every phase of `script` without executing anything.
pub fn plan_script(script: &ScriptDef, ctx: &impl ScriptContext) -> Result<ScriptPlan, ExecuteError> {
  let env = script_env(ctx, script);
  let mut phases = Vec::new();

  for phase in Phase::ORDER {
    if let Some(plan) = prepare_phase(phase, script, ctx, &env)? {
      phases.push(plan);
    }
  }

  Ok(ScriptPlan {
    target: ctx.qualified_name().to_string(),
    script: script.name.clone(),
    phases,
  })
}
