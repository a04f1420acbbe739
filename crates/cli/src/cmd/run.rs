//! Implementation of the `stagehand run` command.
//!
//! Executes the pre, run and post phases of one script. Dependencies are
//! listed but not executed; ordering targets is left to the caller.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_lib::execute::{OutputSink, SubprocessInvoker, run_script};

use crate::output::{OutputFormat, eprint_info, format_duration, print_error, print_info, print_json, print_success, print_warning};

use super::{context, load_project};

/// Prints subprocess output as it arrives.
///
/// With `quiet_stdout`, subprocess stdout goes to stderr so that stdout only
/// carries the JSON report.
struct ConsoleSink {
  quiet_stdout: bool,
}

impl OutputSink for ConsoleSink {
  fn stdout_line(&self, _target: &str, line: &str) {
    if self.quiet_stdout {
      eprintln!("{}", line);
    } else {
      println!("{}", line);
    }
  }

  fn stderr_line(&self, _target: &str, line: &str) {
    eprintln!("{}", line);
  }

  fn status(&self, _target: &str, message: &str) {
    if self.quiet_stdout {
      eprint_info(message);
    } else {
      print_info(message);
    }
  }
}

pub fn cmd_run(
  file: &Path,
  root: Option<&Path>,
  target_name: &str,
  script_name: &str,
  environment: Option<&str>,
  format: OutputFormat,
) -> Result<()> {
  let project = load_project(file, root)?;
  let target = project.target(target_name)?;
  let script = target.script(script_name)?;
  let ctx = context(&project, target, environment)?;

  if !script.deps.is_empty() {
    print_warning(&format!("Not running dependencies: {}", script.deps.join(", ")));
  }

  let sink = ConsoleSink {
    quiet_stdout: format.is_json(),
  };
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  match rt.block_on(run_script(script, &ctx, &SubprocessInvoker, &sink)) {
    Ok(report) => {
      if format.is_json() {
        return print_json(&report);
      }
      print_success(&format!(
        "{} ({}) finished in {}",
        report.target,
        report.script,
        format_duration(report.total_duration())
      ));
      Ok(())
    }
    Err(failure) => {
      print_error(&format!("{} ({}) failed", target.qualified_name, script.name));
      if let Some(debug_command) = &failure.report.debug_command {
        eprint_info(&format!("Reproduce the run phase with: {}", debug_command));
      }
      Err(failure.error).with_context(|| format!("Script '{}' of {} failed", script.name, target.qualified_name))
    }
  }
}
