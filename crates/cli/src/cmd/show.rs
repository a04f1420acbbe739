//! Implementation of the `stagehand show` command.
//!
//! Prepares every phase of one script without executing anything and prints
//! the command lines together with the debug command of the run phase.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_lib::execute::{PhasePlan, ScriptContext, plan_script};
use stagehand_lib::target::TargetContext;

use crate::output::{OutputFormat, print_info, print_json, print_phase, print_stat};

use super::{context, load_project};

pub fn cmd_show(
  file: &Path,
  root: Option<&Path>,
  target_name: &str,
  script_name: &str,
  environment: Option<&str>,
  verbose: bool,
  format: OutputFormat,
) -> Result<()> {
  let project = load_project(file, root)?;
  let target = project.target(target_name)?;
  let script = target.script(script_name)?;
  let ctx = context(&project, target, environment)?;

  let plan = plan_script(script, &ctx)
    .with_context(|| format!("Failed to prepare script '{}' of {}", script.name, target.qualified_name))?;

  if format.is_json() {
    let phases: Vec<_> = plan
      .phases
      .iter()
      .map(|p| phase_json(p, &ctx))
      .collect();
    let json_output = serde_json::json!({
      "target": plan.target,
      "script": plan.script,
      "cwd": target.cwd,
      "environment": ctx.environment(),
      "deps": script.deps,
      "phases": phases,
      "debug_command": plan.debug_command().map(|d| ctx.mask(d)),
    });
    return print_json(&json_output);
  }

  println!("{} ({})", plan.target, plan.script);
  print_stat("cwd", &target.cwd.display().to_string());
  if let Some(environment) = ctx.environment() {
    print_stat("environment", environment);
  }
  if !script.deps.is_empty() {
    print_stat("deps", &script.deps.join(", "));
  }

  if plan.phases.is_empty() {
    print_info("Nothing to run");
    return Ok(());
  }

  println!();
  for phase in &plan.phases {
    print_phase(phase.phase().as_str(), &ctx.mask(phase.command_line()));
  }

  if let Some(debug_command) = plan.debug_command() {
    println!();
    println!("Debug command:");
    println!("  {}", ctx.mask(debug_command));
  }

  if verbose {
    if let Some(first) = plan.phases.first() {
      println!();
      println!("Environment:");
      for (name, value) in ctx.redact(&first.invocation.env) {
        println!("  {}={}", name, value);
      }
    }
  }

  Ok(())
}

/// JSON form of one phase, with secret values masked.
fn phase_json(plan: &PhasePlan, ctx: &TargetContext<'_>) -> serde_json::Value {
  let argv: Vec<String> = plan.invocation.argv.iter().map(|arg| ctx.mask(arg)).collect();
  serde_json::json!({
    "phase": plan.phase(),
    "command_line": ctx.mask(plan.command_line()),
    "argv": argv,
    "debug_command": ctx.mask(&plan.debug_command),
    "env": ctx.redact(&plan.invocation.env),
  })
}
