//! Script execution.
//!
//! A script runs as three phases in a fixed order: pre, run, post. Each
//! phase is lowered to a single shell invocation and the first failing
//! phase aborts the script. This module provides:
//! - [`run_script`]: the phase driver
//! - [`plan_script`]: the same lowering without executing anything
//! - [`ScriptContext`]: what a driver needs to know about the target

pub mod plan;
pub mod shell;
pub mod sink;
pub mod types;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::placeholder::Interpolate;
use crate::script::{Phase, ScriptDef};

pub use plan::{PhasePlan, ScriptPlan, join_commands, plan_script, prepare_phase, script_env};
pub use shell::{ShellConfig, ShellFamily, ShellInvoker, SubprocessInvoker, quote};
pub use sink::{CollectingSink, OutputSink, SinkLine, TracingSink};
pub use types::{ExecuteError, Invocation, PhaseOutcome, ScriptFailure, ScriptReport};

/// The target-side view a script driver needs.
///
/// Interpolation of raw commands goes through the [`Interpolate`]
/// supertrait, so placeholder resolution stays with the context.
pub trait ScriptContext: Interpolate + Sync {
  /// Qualified name of the target, e.g. `//pkg:app`.
  fn qualified_name(&self) -> &str;

  /// Directory every phase runs in.
  fn working_dir(&self) -> &Path;

  /// Environment shared by every script of the target.
  fn base_env(&self) -> &BTreeMap<String, String>;

  fn shell(&self) -> &ShellConfig;

  /// `text` with secret values hidden.
  ///
  /// Applied to everything logged, reported or returned in errors; never
  /// to what is executed.
  fn mask(&self, text: &str) -> String {
    text.to_string()
  }
}

/// Execute one prepared phase.
pub async fn run_phase<C, I>(
  plan: &PhasePlan,
  ctx: &C,
  invoker: &I,
  sink: &dyn OutputSink,
) -> Result<PhaseOutcome, ExecuteError>
where
  C: ScriptContext,
  I: ShellInvoker + Sync,
{
  let phase = plan.phase();
  let target = ctx.qualified_name();
  let command_line = ctx.mask(plan.command_line());

  if phase == Phase::Run {
    sink.status(target, &format!("Executing {target}"));
  }
  info!(target_name = %target, %phase, cmd = %command_line, "executing command");

  let started = Instant::now();
  invoker.invoke(&plan.invocation, target, sink).await?;

  Ok(PhaseOutcome {
    phase,
    command_line,
    duration: started.elapsed(),
  })
}

/// Run `script` against `ctx`.
///
/// Phases execute in [`Phase::ORDER`]. Interpolation of a phase happens
/// right before it runs, so an earlier phase has already executed when a
/// later one fails to interpolate. The first error aborts the script and
/// later phases are never invoked; the failure carries what ran so far.
pub async fn run_script<C, I>(
  script: &ScriptDef,
  ctx: &C,
  invoker: &I,
  sink: &dyn OutputSink,
) -> Result<ScriptReport, ScriptFailure>
where
  C: ScriptContext,
  I: ShellInvoker + Sync,
{
  let target = ctx.qualified_name();
  info!(target_name = %target, script = %script.name, "running script");

  let env = script_env(ctx, script);
  let mut report = ScriptReport {
    target: target.to_string(),
    script: script.name.clone(),
    phases: Vec::new(),
    debug_command: None,
  };

  for phase in Phase::ORDER {
    let result = match prepare_phase(phase, script, ctx, &env) {
      Ok(Some(plan)) => {
        if phase == Phase::Run {
          let debug_command = ctx.mask(&plan.debug_command);
          debug!(debug_command = %debug_command, "run phase");
          report.debug_command = Some(debug_command);
        }
        run_phase(&plan, ctx, invoker, sink).await
      }
      Ok(None) => {
        debug!(%phase, script = %script.name, "phase has no commands, skipping");
        continue;
      }
      Err(e) => Err(e),
    };

    match result {
      Ok(outcome) => report.phases.push(outcome),
      Err(e) => {
        let error = e.masked(|text| ctx.mask(text));
        error!(target_name = %target, script = %script.name, %phase, error = %error, "phase failed");
        return Err(ScriptFailure { error, report });
      }
    }
  }

  info!(
    target_name = %target,
    script = %script.name,
    phases = report.phases.len(),
    "script complete"
  );

  Ok(report)
}
